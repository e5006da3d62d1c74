use std::ffi::OsStr;
use std::path::Path;

use serde::Deserialize;

use super::{Ffmpeg, LoudnessAnalyzer, ToolError};

/// Integrated loudness (LUFS) and true peak (dBTP) of one track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Loudness {
    pub integrated: f64,
    pub true_peak: f64,
}

/// Track-level replay gain derived from a loudness measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackGain {
    pub gain_db: f64,
    /// Linear peak amplitude.
    pub peak: f64,
}

impl TrackGain {
    pub fn from_loudness(target_lufs: f64, loudness: Loudness) -> Self {
        Self {
            gain_db: target_lufs - loudness.integrated,
            peak: 10f64.powf(loudness.true_peak / 20.0),
        }
    }

    pub fn gain_text(&self) -> String {
        format!("{:.2} dB", self.gain_db)
    }

    pub fn peak_text(&self) -> String {
        format!("{:.6}", self.peak)
    }
}

/// Measures loudness with ffmpeg's `loudnorm` filter in analysis mode.
pub struct FfmpegLoudness {
    ffmpeg: Ffmpeg,
}

impl FfmpegLoudness {
    pub fn new(ffmpeg: Ffmpeg) -> Self {
        Self { ffmpeg }
    }
}

impl LoudnessAnalyzer for FfmpegLoudness {
    fn measure(&self, path: &Path) -> Result<Loudness, ToolError> {
        let args = [
            OsStr::new("-hide_banner"),
            OsStr::new("-nostdin"),
            OsStr::new("-i"),
            path.as_os_str(),
            OsStr::new("-af"),
            OsStr::new("loudnorm=I=-18:TP=-1.5:LRA=11:print_format=json"),
            OsStr::new("-f"),
            OsStr::new("null"),
            OsStr::new("-"),
        ];
        let output = self.ffmpeg.run(args)?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        parse_loudnorm(&combined)
    }
}

#[derive(Deserialize)]
struct LoudnormReport {
    input_i: String,
    input_tp: String,
}

/// Pull the JSON block loudnorm prints at the end of its log.
fn parse_loudnorm(log: &str) -> Result<Loudness, ToolError> {
    let start = log
        .rfind('{')
        .ok_or_else(|| ToolError::Parse("no loudnorm JSON found".to_string()))?;
    let end = log[start..]
        .find('}')
        .map(|i| start + i + 1)
        .ok_or_else(|| ToolError::Parse("unterminated loudnorm JSON".to_string()))?;

    let report: LoudnormReport = serde_json::from_str(&log[start..end])
        .map_err(|e| ToolError::Parse(format!("loudnorm JSON: {e}")))?;

    let number = |field: &str, value: &str| {
        value
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| ToolError::Parse(format!("loudnorm {field} = {value:?}")))
    };

    Ok(Loudness {
        integrated: number("input_i", &report.input_i)?,
        true_peak: number("input_tp", &report.input_tp)?,
    })
}
