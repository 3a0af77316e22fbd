//! Terminal surface: an interactive menu loop and a one-shot scripted run.

use crate::error::ScanError;
use crate::markdown::MarkdownRenderer;
use crate::providers::AnalysisService;
use crate::scan::{ImageFormat, Session, SimplifyChoice, UploadedImage};
use anyhow::{bail, Context, Result};
use console::style;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Select};
use std::fmt;
use std::io::Cursor;
use std::path::{Path, PathBuf};

const TITLE: &str = "Medical Image Analysis App";
const ABOUT: &str = "Upload an image of a medical scan to receive an AI-based analysis.";
const NOTHING_TO_SIMPLIFY: &str = "The analysis came back empty; there is nothing to simplify.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuAction {
    Upload,
    Analyze,
    Simplify,
    Quit,
}

impl fmt::Display for MenuAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Upload => "Upload an image (jpg, jpeg, png)",
            Self::Analyze => "Analyze image",
            Self::Simplify => "ELI5 - Explain Like I'm 5",
            Self::Quit => "Quit",
        };
        f.write_str(label)
    }
}

/// Menu entries for the current session; simplify only once an analysis exists.
fn menu(has_analysis: bool) -> Vec<MenuAction> {
    let mut actions = vec![MenuAction::Upload, MenuAction::Analyze];
    if has_analysis {
        actions.push(MenuAction::Simplify);
    }
    actions.push(MenuAction::Quit);
    actions
}

/// Run the menu loop until the user quits, then clean up the session.
pub async fn run_interactive<S: AnalysisService>(mut session: Session<S>) -> Result<()> {
    println!("{}", style(TITLE).bold().cyan());
    println!("{}\n", style(ABOUT).dim());

    let outcome = interactive_loop(&mut session).await;
    session.close().await;
    outcome
}

async fn interactive_loop<S: AnalysisService>(session: &mut Session<S>) -> Result<()> {
    let theme = ColorfulTheme::default();
    loop {
        let actions = menu(session.ready().is_some());
        let picked = Select::with_theme(&theme)
            .with_prompt("What would you like to do?")
            .items(&actions)
            .default(0)
            .interact()?;

        match actions[picked] {
            MenuAction::Upload => {
                let path: String = Input::with_theme(&theme)
                    .with_prompt(format!(
                        "Image path ({})",
                        ImageFormat::ALLOWED_EXTENSIONS.join(", ")
                    ))
                    .interact_text()?;
                if let Err(e) = upload(session, &entered_path(&path)).await {
                    recover(e)?;
                }
            }
            MenuAction::Analyze => match session.analyze().await {
                Ok(text) => render("Analysis", text),
                Err(e) => recover(e)?,
            },
            MenuAction::Simplify => {
                let Some(ready) = session.ready() else { continue };
                println!("{}", style("Would you like a simplified explanation?").blue());
                let choice = Select::with_theme(&theme)
                    .with_prompt("ELI5 - Explain Like I'm 5")
                    .items(&SimplifyChoice::ALL)
                    .default(0)
                    .interact()?;
                match ready.choose(SimplifyChoice::ALL[choice]).await {
                    Ok(Some(text)) => render("Simplified explanation", &text),
                    Ok(None) => {}
                    Err(e) => recover(e)?,
                }
            }
            MenuAction::Quit => return Ok(()),
        }
    }
}

/// Stage, analyze and optionally simplify one image without prompting.
pub async fn run_once<S: AnalysisService>(
    mut session: Session<S>,
    image: &Path,
    simplify: bool,
) -> Result<()> {
    let outcome = one_shot(&mut session, image, simplify).await;
    session.close().await;
    outcome
}

async fn one_shot<S: AnalysisService>(
    session: &mut Session<S>,
    image: &Path,
    simplify: bool,
) -> Result<()> {
    if let Err(e) = upload(session, image).await {
        bail!(e.user_message());
    }
    match session.analyze().await {
        Ok(text) => render("Analysis", text),
        Err(e) => bail!(e.user_message()),
    }

    let choice = if simplify {
        SimplifyChoice::Yes
    } else {
        SimplifyChoice::No
    };
    match session.ready() {
        Some(ready) => match ready.choose(choice).await {
            Ok(Some(text)) => render("Simplified explanation", &text),
            Ok(None) => {}
            Err(e) => bail!(e.user_message()),
        },
        None if simplify => {
            println!("{}", style(NOTHING_TO_SIMPLIFY).yellow());
        }
        None => {}
    }
    Ok(())
}

async fn upload<S: AnalysisService>(session: &mut Session<S>, path: &Path) -> Result<(), ScanError> {
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();
    // Reject by extension before touching the file.
    let image = UploadedImage::new(filename, Vec::new())?;
    let image = UploadedImage {
        bytes: tokio::fs::read(path).await?,
        ..image
    };

    println!("{}", preview(&image));
    session.upload(image).await?;
    Ok(())
}

/// A typed-in path: surrounding whitespace dropped, leading `~` expanded.
fn entered_path(input: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(input.trim()).into_owned())
}

/// One-line stand-in for an image preview: name, format, dimensions, size.
pub fn preview(image: &UploadedImage) -> String {
    let dims = image_dimensions(&image.bytes)
        .map(|(w, h)| format!("{w}x{h}"))
        .unwrap_or_else(|e| {
            tracing::debug!(error = %e, "could not decode image header");
            "unknown size".to_string()
        });
    format!(
        "{} {} ({}, {}, {} bytes)",
        style("Uploaded Image:").bold(),
        image.filename,
        image.format,
        dims,
        image.bytes.len()
    )
}

fn image_dimensions(bytes: &[u8]) -> Result<(u32, u32)> {
    let reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .context("cannot sniff image format")?;
    reader.into_dimensions().context("cannot read image dimensions")
}

fn render(title: &str, text: &str) {
    println!("\n{}", style(title).bold().underlined());
    println!("{}\n", MarkdownRenderer::for_terminal().render(text));
}

/// Show a recoverable error and carry on; fatal ones end the session.
fn recover(error: ScanError) -> Result<()> {
    if error.is_fatal() {
        bail!(error.user_message());
    }
    eprintln!("{}", style(error.user_message()).red());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScanResult;
    use crate::scan::{EncodedPayload, ImageStaging};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Returns an empty analysis and counts simplify calls.
    #[derive(Default)]
    struct EmptyAnalysis {
        simplify_calls: AtomicUsize,
    }

    #[async_trait]
    impl AnalysisService for EmptyAnalysis {
        async fn analyze(&self, _payload: &EncodedPayload) -> ScanResult<String> {
            Ok(String::new())
        }

        async fn simplify(&self, _analysis: &str) -> ScanResult<String> {
            self.simplify_calls.fetch_add(1, Ordering::SeqCst);
            Ok("simple".into())
        }
    }

    #[tokio::test]
    async fn one_shot_simplify_skips_empty_analysis() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("scan.png");
        std::fs::write(&image, [0x89, 0x50, 0x4e, 0x47]).unwrap();

        let service = Arc::new(EmptyAnalysis::default());
        let staging = ImageStaging::new(dir.path().join("staged").to_str().unwrap());
        let mut session = Session::new(service.clone(), staging);

        one_shot(&mut session, &image, true).await.unwrap();
        assert_eq!(session.analysis(), Some(""));
        assert_eq!(service.simplify_calls.load(Ordering::SeqCst), 0);
        session.close().await;
    }

    #[test]
    fn simplify_only_listed_after_analysis() {
        assert!(!menu(false).contains(&MenuAction::Simplify));
        assert_eq!(
            menu(true),
            vec![
                MenuAction::Upload,
                MenuAction::Analyze,
                MenuAction::Simplify,
                MenuAction::Quit
            ]
        );
    }

    #[test]
    fn recover_continues_after_user_errors_only() {
        assert!(recover(ScanError::MissingInput).is_ok());
        assert!(recover(ScanError::UnsupportedFormat("gif".into())).is_ok());
        let err = recover(ScanError::Configuration("OpenAI API Key is missing.".into())).unwrap_err();
        assert_eq!(err.to_string(), "OpenAI API Key is missing.");
    }

    #[test]
    fn entered_path_is_trimmed_and_expanded() {
        assert_eq!(entered_path("  scan.jpg \n"), PathBuf::from("scan.jpg"));
        if std::env::var_os("HOME").is_some() {
            let path = entered_path("~/scans/chest.png");
            assert!(!path.starts_with("~"), "{path:?}");
            assert!(path.ends_with("scans/chest.png"));
        }
    }

    #[test]
    fn preview_reports_unknown_size_for_garbage() {
        let image = UploadedImage::new("scan.jpg", vec![1, 2, 3]).unwrap();
        let line = preview(&image);
        assert!(line.contains("scan.jpg"));
        assert!(line.contains("unknown size"));
        assert!(line.contains("3 bytes"));
    }

    #[test]
    fn preview_reads_png_dimensions() {
        let mut bytes = Vec::new();
        image::RgbImage::new(4, 3)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        let image = UploadedImage::new("photo.png", bytes).unwrap();
        assert!(preview(&image).contains("4x3"));
    }
}
