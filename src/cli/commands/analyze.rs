//! One-shot analysis command.

use std::path::Path;

use anyhow::Context;
use chrono::Utc;
use console::style;

use crate::config::Config;
use crate::pipeline::{stored_file_name, Analyzer, UploadedArtifact};
use crate::report::{render_report, ReportAnalysis};

/// Analyze a local file and print `{ "analysis": ... }` to stdout.
///
/// The file is copied into the upload directory first; the pipeline deletes
/// its input, and that must never be the user's file.
pub async fn cmd_analyze(
    config: &Config,
    file: &Path,
    report: Option<&Path>,
    pretty: bool,
) -> anyhow::Result<()> {
    let analyzer = Analyzer::from_config(config.analyzer.clone())?;

    let original_name = file
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("upload")
        .to_string();

    tokio::fs::create_dir_all(&config.server.upload_dir)
        .await
        .with_context(|| {
            format!(
                "failed to create upload directory {}",
                config.server.upload_dir.display()
            )
        })?;
    let stored = config.server.upload_dir.join(stored_file_name(&original_name));
    let artifact = UploadedArtifact::new(&stored, original_name.as_str());
    tokio::fs::copy(file, &stored)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;

    eprintln!(
        "{} Analyzing {} ({})",
        style("→").cyan(),
        original_name,
        artifact.format()
    );

    let analysis = match analyzer.analyze(artifact).await {
        Ok(analysis) => analysis,
        Err(e) => {
            eprintln!("{} [{}] {}", style("✗").red(), e.category(), e);
            if let Some(raw) = e.raw_output() {
                eprintln!("\n{}\n{}", style("Raw model output:").dim(), raw);
            }
            return Err(anyhow::anyhow!("analysis failed ({})", e.category()));
        }
    };

    let output = serde_json::json!({ "analysis": analysis });
    let json = if pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    println!("{}", json);

    if let Some(report_path) = report {
        let html = render_report(
            Some(&original_name),
            &ReportAnalysis::from(&analysis),
            Utc::now(),
        )?;
        tokio::fs::write(report_path, html)
            .await
            .with_context(|| format!("failed to write report {}", report_path.display()))?;
        eprintln!(
            "{} Report written to {}",
            style("✓").green(),
            report_path.display()
        );
    }

    Ok(())
}
