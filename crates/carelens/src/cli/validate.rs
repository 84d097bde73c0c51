//! The `carelens validate` command: run the X-ray intake validator offline.

use std::path::{Path, PathBuf};

use carelens_core::{ColorStats, Config, ImageValidator, Validation};
use clap::Args;
use serde::Serialize;

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Image files to check
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Emit one JSON object per file instead of text
    #[arg(long)]
    pub json: bool,
}

/// Outcome for a single file.
#[derive(Debug, Serialize)]
struct FileReport {
    path: PathBuf,
    accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    avg_color_diff: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mean_brightness: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    std_brightness: Option<f64>,
}

impl FileReport {
    fn rejected(path: &Path, reason: String) -> Self {
        Self {
            path: path.to_path_buf(),
            accepted: false,
            reason: Some(reason),
            width: None,
            height: None,
            avg_color_diff: None,
            mean_brightness: None,
            std_brightness: None,
        }
    }

    fn render(&self) -> String {
        if self.accepted {
            format!(
                "accepted  {}  {}x{}  color_diff={:.2} brightness={:.2} contrast={:.2}",
                self.path.display(),
                self.width.unwrap_or_default(),
                self.height.unwrap_or_default(),
                self.avg_color_diff.unwrap_or_default(),
                self.mean_brightness.unwrap_or_default(),
                self.std_brightness.unwrap_or_default(),
            )
        } else {
            format!(
                "rejected  {}  {}",
                self.path.display(),
                self.reason.as_deref().unwrap_or_default()
            )
        }
    }
}

pub async fn execute(args: ValidateArgs, config: Config) -> anyhow::Result<()> {
    let validator = ImageValidator::new(config.validator);
    let total = args.files.len();
    let mut rejected = 0;

    for path in &args.files {
        let report = match tokio::fs::read(path).await {
            Ok(bytes) => {
                let validator = validator.clone();
                let path = path.clone();
                tokio::task::spawn_blocking(move || check(&validator, &path, &bytes)).await?
            }
            Err(e) => FileReport::rejected(path, format!("Could not read file: {e}")),
        };

        if !report.accepted {
            rejected += 1;
        }
        if args.json {
            println!("{}", serde_json::to_string(&report)?);
        } else {
            println!("{}", report.render());
        }
    }

    tracing::debug!("Validated {total} files, {rejected} rejected");
    if rejected > 0 {
        anyhow::bail!("{rejected} of {total} files rejected");
    }
    Ok(())
}

fn check(validator: &ImageValidator, path: &Path, bytes: &[u8]) -> FileReport {
    match validator.validate(bytes) {
        Validation::Accepted(image) => {
            let stats = ColorStats::measure(&image.pixels);
            FileReport {
                path: path.to_path_buf(),
                accepted: true,
                reason: None,
                width: Some(image.width),
                height: Some(image.height),
                avg_color_diff: Some(stats.avg_color_diff),
                mean_brightness: Some(stats.mean_brightness),
                std_brightness: Some(stats.std_brightness),
            }
        }
        Validation::Rejected(rejection) => FileReport::rejected(path, rejection.reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, ImageFormat, Luma};
    use std::io::Cursor;

    fn two_tone_png(width: u32, height: u32) -> Vec<u8> {
        let img = GrayImage::from_fn(width, height, |x, _| {
            if x % 2 == 0 { Luma([0]) } else { Luma([200]) }
        });
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_check_accepted_reports_stats() {
        let report = check(&ImageValidator::default(), Path::new("a.png"), &two_tone_png(200, 200));
        assert!(report.accepted);
        assert_eq!(report.width, Some(200));
        assert_eq!(report.mean_brightness, Some(100.0));
        assert_eq!(report.std_brightness, Some(100.0));
        assert!(report.render().starts_with("accepted  a.png  200x200"));
    }

    #[test]
    fn test_check_rejected_reports_reason() {
        let report = check(&ImageValidator::default(), Path::new("small.png"), &two_tone_png(50, 50));
        assert!(!report.accepted);
        assert_eq!(
            report.reason.as_deref(),
            Some("Image too small. Minimum size: 100x100px")
        );
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["accepted"], false);
        assert!(json.get("width").is_none());
    }

    #[tokio::test]
    async fn test_execute_fails_when_any_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.png");
        std::fs::write(&good, two_tone_png(200, 200)).unwrap();

        let ok = ValidateArgs {
            files: vec![good.clone()],
            json: false,
        };
        assert!(execute(ok, Config::default()).await.is_ok());

        let with_missing = ValidateArgs {
            files: vec![good, dir.path().join("missing.png")],
            json: true,
        };
        let err = execute(with_missing, Config::default()).await.unwrap_err();
        assert_eq!(err.to_string(), "1 of 2 files rejected");
    }
}
