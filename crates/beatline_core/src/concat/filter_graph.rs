//! ffmpeg argument builder for the concatenation plan.
//!
//! Input layout: every audio file in plan order, then the silence source
//! (when any silence is needed). The graph normalizes each audio input,
//! splits the silence source once into one slice per silence segment, and
//! concatenates everything in plan order.

use std::path::Path;

use crate::config::{AudioSettings, ConcatSettings};
use crate::timeline::{ConcatInput, ConcatPlan};

/// Label of the concatenated output stream.
pub const OUTPUT_LABEL: &str = "aout";

/// Builds ffmpeg tokens for a `ConcatPlan`.
pub struct FilterGraph<'a> {
    plan: &'a ConcatPlan,
    audio: &'a AudioSettings,
    concat: &'a ConcatSettings,
}

impl<'a> FilterGraph<'a> {
    pub fn new(plan: &'a ConcatPlan, audio: &'a AudioSettings, concat: &'a ConcatSettings) -> Self {
        Self {
            plan,
            audio,
            concat,
        }
    }

    /// Complete ffmpeg argument list, excluding the program name.
    pub fn build(&self, output_path: &Path) -> Vec<String> {
        let mut tokens = vec!["-hide_banner".to_string(), "-nostdin".to_string()];

        self.add_inputs(&mut tokens);

        tokens.push("-filter_complex".to_string());
        tokens.push(self.graph());

        tokens.push("-map".to_string());
        tokens.push(format!("[{}]", OUTPUT_LABEL));
        tokens.push("-y".to_string());
        tokens.push(output_path.to_string_lossy().to_string());

        tokens
    }

    /// The `-filter_complex` expression on its own.
    pub fn graph(&self) -> String {
        let mut chains = Vec::new();
        let mut concat_labels = String::new();

        let aformat = self.aformat();
        let mut audio_index = 0;

        for input in &self.plan.inputs {
            match input {
                ConcatInput::Audio { duration, .. } => {
                    chains.push(format!(
                        "[{i}:a]{aformat},atrim=duration={d}[a_{i}]",
                        i = audio_index,
                        d = secs(*duration)
                    ));
                    concat_labels.push_str(&format!("[a_{}]", audio_index));
                    audio_index += 1;
                }
                ConcatInput::Silence {
                    slice, duration, ..
                } => {
                    chains.push(format!(
                        "[ls_{k}]atrim=start=0:end={d}[pad_{k}]",
                        k = slice,
                        d = secs(*duration)
                    ));
                    concat_labels.push_str(&format!("[pad_{}]", slice));
                }
            }
        }

        if self.plan.needs_silence() {
            let outputs: String = (0..self.plan.silence_slices)
                .map(|k| format!("[ls_{}]", k))
                .collect();
            chains.insert(
                0,
                format!(
                    "[{}:a]{},asplit={}{}",
                    self.silence_input_index(),
                    aformat,
                    self.plan.silence_slices,
                    outputs
                ),
            );
        }

        chains.push(format!(
            "{}concat=n={}:v=0:a=1[{}]",
            concat_labels,
            self.plan.inputs.len(),
            OUTPUT_LABEL
        ));

        chains.join(";")
    }

    /// ffmpeg input index of the silence source.
    fn silence_input_index(&self) -> usize {
        self.plan.audio_inputs().count()
    }

    fn add_inputs(&self, tokens: &mut Vec<String>) {
        for input in self.plan.audio_inputs() {
            if let ConcatInput::Audio { source, .. } = input {
                tokens.push("-i".to_string());
                tokens.push(source.as_tool_arg());
            }
        }

        if !self.plan.needs_silence() {
            return;
        }

        if self.concat.silence_source.is_empty() {
            tokens.push("-f".to_string());
            tokens.push("lavfi".to_string());
            tokens.push("-i".to_string());
            tokens.push(format!(
                "anullsrc=r={}:cl={}",
                self.audio.sample_rate, self.audio.channel_layout
            ));
        } else {
            tokens.push("-stream_loop".to_string());
            tokens.push("-1".to_string());
            tokens.push("-i".to_string());
            tokens.push(self.concat.silence_source.clone());
        }
    }

    fn aformat(&self) -> String {
        format!(
            "aformat=sample_fmts=fltp:sample_rates={}:channel_layouts={}",
            self.audio.sample_rate, self.audio.channel_layout
        )
    }
}

/// Seconds with up to microsecond precision and no trailing zeros.
fn secs(value: f64) -> String {
    let s = format!("{:.6}", value);
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}
