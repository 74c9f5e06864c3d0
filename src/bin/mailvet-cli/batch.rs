use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result, bail};
use mailvet::{BatchEvent, BatchSummary, Engine, ValidateOptions};
use tracing::info;

use crate::output;

/// Adresses à valider, une par ligne. Les lignes vides sont ignorées.
pub fn read_emails(file: Option<&Path>) -> Result<Vec<String>> {
    match file {
        Some(path) => {
            let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
            collect_lines(BufReader::new(f))
        }
        None => collect_lines(io::stdin().lock()),
    }
}

fn collect_lines(reader: impl BufRead) -> Result<Vec<String>> {
    let mut emails = Vec::new();
    for line in reader.lines() {
        let line = line.context("read input")?;
        let email = line.trim();
        if !email.is_empty() {
            emails.push(email.to_string());
        }
    }
    Ok(emails)
}

/// Lance le lot et écrit chaque évènement dès réception.
pub fn run(
    engine: &Engine,
    emails: Vec<String>,
    options: ValidateOptions,
    format: &str,
) -> Result<BatchSummary> {
    let mut sink = Sink::new(format)?;
    let stream = engine.validate_batch(emails, options)?;
    let mut summary = None;
    for event in stream {
        sink.write(&event)?;
        if let BatchEvent::Complete(done) = event {
            summary = Some(done);
        }
    }
    sink.finish()?;
    match summary {
        Some(summary) => {
            info!("{}", output::summary_line(&summary));
            Ok(summary)
        }
        None => bail!("batch ended without a summary"),
    }
}

enum Sink {
    Human,
    #[cfg(feature = "with-serde")]
    Ndjson,
    #[cfg(feature = "with-csv")]
    Csv(csv::Writer<io::Stdout>),
}

impl Sink {
    fn new(format: &str) -> Result<Self> {
        match format {
            "human" => Ok(Self::Human),
            "ndjson" => Self::ndjson(),
            "csv" => Self::csv(),
            other => bail!("unknown --format '{other}', use: human|ndjson|csv"),
        }
    }

    #[cfg(feature = "with-serde")]
    fn ndjson() -> Result<Self> {
        Ok(Self::Ndjson)
    }

    #[cfg(not(feature = "with-serde"))]
    fn ndjson() -> Result<Self> {
        bail!("format=ndjson nécessite la feature 'with-serde'")
    }

    #[cfg(feature = "with-csv")]
    fn csv() -> Result<Self> {
        let mut wtr = csv::Writer::from_writer(io::stdout());
        let mut header = vec!["email", "valid", "confidence_score", "tier", "risk_score", "risk_level"];
        header.extend(mailvet::Check::ALL.iter().map(|check| check.as_str()));
        header.extend(["suggestion", "stored"]);
        wtr.write_record(&header)?;
        Ok(Self::Csv(wtr))
    }

    #[cfg(not(feature = "with-csv"))]
    fn csv() -> Result<Self> {
        bail!("format=csv nécessite la feature 'with-csv'")
    }

    fn write(&mut self, event: &BatchEvent) -> Result<()> {
        match self {
            Self::Human => {
                match event {
                    BatchEvent::Start { total, mode } => {
                        println!("batch: {total} addresses ({mode:?} mode)");
                    }
                    BatchEvent::Result { result, .. } => {
                        for line in output::human_lines(result) {
                            println!("{line}");
                        }
                    }
                    BatchEvent::Complete(summary) => {
                        println!("done: {}", output::summary_line(summary));
                    }
                }
                Ok(())
            }
            #[cfg(feature = "with-serde")]
            Self::Ndjson => {
                println!("{}", serde_json::to_string(event)?);
                Ok(())
            }
            #[cfg(feature = "with-csv")]
            Self::Csv(wtr) => {
                // seuls les résultats deviennent des lignes
                let BatchEvent::Result { result, stored, .. } = event else {
                    return Ok(());
                };
                let mut record = vec![
                    result.email.clone(),
                    result.valid.to_string(),
                    result.confidence_score.to_string(),
                    result.tier.to_string(),
                    result.risk.score.to_string(),
                    result.risk.level.to_string(),
                ];
                record.extend(
                    mailvet::Check::ALL
                        .iter()
                        .map(|check| output::check_cell(result, *check).to_string()),
                );
                record.push(result.suggestion.clone().unwrap_or_default());
                record.push(stored.to_string());
                wtr.write_record(&record)?;
                wtr.flush()?;
                Ok(())
            }
        }
    }

    fn finish(&mut self) -> Result<()> {
        #[cfg(feature = "with-csv")]
        if let Self::Csv(wtr) = self {
            wtr.flush()?;
        }
        Ok(())
    }
}
