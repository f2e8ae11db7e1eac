use crate::view::{DashboardView, FetchStatus};
use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

/// Renders dashboard frames to the console or a file
pub struct OutputHandler {
    format: OutputFormat,
    writer: Option<Box<dyn Write + Send>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OutputFormat {
    Json,
    Jsonl,
    Console,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "jsonl" => OutputFormat::Jsonl,
            "console" => OutputFormat::Console,
            _ => OutputFormat::Console, // Default
        }
    }
}

impl OutputHandler {
    /// Create a new output handler
    pub fn new(format: OutputFormat, file_path: Option<PathBuf>) -> Result<Self, Box<dyn std::error::Error>> {
        let writer: Option<Box<dyn Write + Send>> = match (&format, file_path) {
            (OutputFormat::Console, _) => None,
            (_, Some(path)) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)?;
                Some(Box::new(BufWriter::new(file)))
            }
            (_, None) => None,
        };

        Ok(OutputHandler {
            format,
            writer,
        })
    }

    /// Write one dashboard frame
    pub fn write_view(&mut self, view: &DashboardView) -> Result<(), Box<dyn std::error::Error>> {
        let output = match &self.format {
            OutputFormat::Json => format!("{}\n", serde_json::to_string_pretty(view)?),
            OutputFormat::Jsonl => format!("{}\n", serde_json::to_string(view)?),
            OutputFormat::Console => render_console(view),
        };
        self.write_output(&output)
    }

    /// Write a plain line of text (notices, help)
    pub fn write_line(&mut self, line: &str) -> Result<(), Box<dyn std::error::Error>> {
        self.write_output(&format!("{}\n", line))
    }

    fn write_output(&mut self, data: &str) -> Result<(), Box<dyn std::error::Error>> {
        match &mut self.writer {
            Some(writer) => {
                writer.write_all(data.as_bytes())?;
                writer.flush()?;
            }
            None => {
                print!("{}", data);
                std::io::stdout().flush()?;
            }
        }
        Ok(())
    }

    /// Flush any buffered output
    pub fn flush(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(writer) = &mut self.writer {
            writer.flush()?;
        }
        Ok(())
    }
}

/// Plain-text rendering of a dashboard frame
pub fn render_console(view: &DashboardView) -> String {
    let mut out = String::new();

    if !view.authorized {
        out.push_str("Admin login required (use: login <password>)\n");
        return out;
    }
    if view.loading {
        out.push_str("Loading risk data...\n");
        return out;
    }

    // Writing into a String never fails
    let _ = writeln!(
        out,
        "Predictive Risk Dashboard [model: {}, filter: {}, sort: {}]",
        view.model, view.filter, view.sort_key
    );
    let _ = writeln!(out, "Models: {}", view.model_options.join(" | "));
    if let FetchStatus::Failed { at, message } = &view.fetch_status {
        let _ = writeln!(out, "! last refresh failed at {}: {}", at.to_rfc3339(), message);
    }

    if view.cards.is_empty() {
        out.push_str("  (no records)\n");
    }
    for card in &view.cards {
        let _ = writeln!(
            out,
            "  User: {:<12} Score: {:>6} Status: {} ({})",
            card.id, card.score, card.status, card.color
        );
        for reason in &card.reasons {
            let _ = writeln!(out, "    - {}", reason);
        }
    }

    if let Some(detail) = &view.detail {
        let _ = writeln!(out, "Score Trend - {} ({})", detail.id, detail.color);
        let points: Vec<String> = detail
            .trend
            .iter()
            .map(|p| format!("{}={}", p.time, p.score))
            .collect();
        let _ = writeln!(out, "  {}", points.join(" "));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Filter, RiskRecord, SortKey};
    use crate::view::{Color, Detail, TrendPoint};

    fn sample_view() -> DashboardView {
        let records = vec![
            RiskRecord::new("u1", 80.0, "high risk").with_reasons(["odd login time"]),
        ];
        let (cards, bars) = DashboardView::from_projection(&records);
        DashboardView {
            authorized: true,
            loading: false,
            filter: Filter::All,
            sort_key: SortKey::Id,
            model: "iforest".to_string(),
            filter_options: Filter::options().to_vec(),
            sort_options: SortKey::options().to_vec(),
            model_options: vec!["iforest".to_string(), "random".to_string()],
            fetch_status: FetchStatus::Idle,
            cards,
            bars,
            detail: None,
        }
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!(OutputFormat::from_str("JSON"), OutputFormat::Json);
        assert_eq!(OutputFormat::from_str("jsonl"), OutputFormat::Jsonl);
        assert_eq!(OutputFormat::from_str("fancy"), OutputFormat::Console);
    }

    #[test]
    fn test_console_render_cards() {
        let text = render_console(&sample_view());

        assert!(text.contains("model: iforest"));
        assert!(text.contains("Models: iforest | random"));
        assert!(text.contains("u1"));
        assert!(text.contains("high risk (red)"));
        assert!(text.contains("- odd login time"));
    }

    #[test]
    fn test_console_render_gates() {
        let mut view = sample_view();
        view.loading = true;
        assert_eq!(render_console(&view), "Loading risk data...\n");

        view.authorized = false;
        assert!(render_console(&view).contains("login required"));
    }

    #[test]
    fn test_console_render_detail() {
        let mut view = sample_view();
        view.detail = Some(Detail {
            id: "u1".to_string(),
            color: Color::Red,
            trend: vec![
                TrendPoint { time: "T1".to_string(), score: 79 },
                TrendPoint { time: "T2".to_string(), score: 84 },
            ],
        });

        let text = render_console(&view);
        assert!(text.contains("Score Trend - u1 (red)"));
        assert!(text.contains("T1=79 T2=84"));
    }

    #[test]
    fn test_jsonl_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frames.jsonl");

        let mut handler = OutputHandler::new(OutputFormat::Jsonl, Some(path.clone())).unwrap();
        handler.write_view(&sample_view()).unwrap();
        handler.write_view(&sample_view()).unwrap();
        handler.flush().unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);

        let frame: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(frame["cards"][0]["color"], "red");
        assert_eq!(frame["bars"][0]["score"], 80.0);
        assert_eq!(frame["filter"], "all");
    }
}
