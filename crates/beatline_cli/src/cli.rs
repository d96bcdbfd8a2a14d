use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "beatline")]
#[command(about = "Reconcile beat timelines and render their audio track")]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to the platform config directory).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Probe and reconcile a script, then print its timing table.
    Plan {
        /// Script JSON file.
        script: PathBuf,

        /// Print the timing table as JSON.
        #[arg(long)]
        json: bool,

        /// Also print the ffmpeg command that would render it.
        #[arg(long)]
        show_command: bool,
    },

    /// Render a script's audio track.
    Render {
        /// Script JSON file.
        script: PathBuf,

        /// Output audio file (defaults to <output_folder>/<script>.m4a).
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write the timing table as JSON next to the output.
        #[arg(long)]
        timing: bool,
    },

    /// Create the config file if needed and print it.
    Config,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_render_with_global_flags() {
        let cli = Cli::parse_from([
            "beatline", "render", "lesson.json", "-o", "out.m4a", "--timing", "-vv",
        ]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Render {
                script,
                output,
                timing,
            } => {
                assert_eq!(script, PathBuf::from("lesson.json"));
                assert_eq!(output, Some(PathBuf::from("out.m4a")));
                assert!(timing);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
