use crate::error::ProbeError;
use crate::model::{OutputConfig, OutputFormat, ProbeOutcome, ProbeReport, TargetSpec};
use crate::tls::HandshakeSummary;
use crate::util::hex;
use serde::Serialize;
use std::io::{BufWriter, Write};

/// Writes probe reports as pretty text or one JSON object per line.
pub struct OutputSink<W: Write> {
    cfg: OutputConfig,
    writer: BufWriter<W>,
}

#[derive(Serialize)]
struct ReportLine<'a> {
    host: &'a str,
    ip: Option<&'a str>,
    port: u16,
    timestamp: &'a str,
    status: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    stage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    connect_ms: Option<u128>,
    #[serde(skip_serializing_if = "Option::is_none")]
    handshake: Option<&'a HandshakeSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    leaked_bytes: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    leaked_hex: Option<String>,
}

impl OutputSink<std::io::Stdout> {
    pub fn stdout(cfg: OutputConfig) -> Self {
        Self::new(cfg, std::io::stdout())
    }
}

impl<W: Write> OutputSink<W> {
    pub fn new(cfg: OutputConfig, writer: W) -> Self {
        Self {
            cfg,
            writer: BufWriter::new(writer),
        }
    }

    pub fn write_report(&mut self, report: &ProbeReport) -> anyhow::Result<()> {
        match self.cfg.format {
            OutputFormat::Jsonl => {
                let (stage, reason) = match &report.outcome {
                    ProbeOutcome::Indeterminate { stage, reason } => {
                        (Some(stage.to_string()), Some(reason.clone()))
                    }
                    ProbeOutcome::Safe(observation) => (None, Some(observation.to_string())),
                    ProbeOutcome::Vulnerable { .. } => (None, None),
                };
                let leaked_hex = match &report.outcome {
                    ProbeOutcome::Vulnerable { leaked } if self.cfg.dump => {
                        Some(hex::to_hex(self.dump_slice(leaked)))
                    }
                    _ => None,
                };
                let line = ReportLine {
                    host: &report.target.host,
                    ip: Some(report.target.addr.as_str()),
                    port: report.target.port,
                    timestamp: &report.timestamp,
                    status: report.outcome.status_text(),
                    stage,
                    reason,
                    connect_ms: report.connect_ms,
                    handshake: report.handshake.as_ref(),
                    leaked_bytes: report.outcome.leaked_len(),
                    leaked_hex,
                };
                writeln!(self.writer, "{}", serde_json::to_string(&line)?)?;
            }
            OutputFormat::Pretty => {
                let host = &report.target.host;
                let port = report.target.port;
                match &report.outcome {
                    ProbeOutcome::Vulnerable { leaked } => {
                        writeln!(
                            self.writer,
                            "Host {host}:{port} is vulnerable! Heartbeat response payload: {} bytes",
                            leaked.len()
                        )?;
                        if self.cfg.dump {
                            let shown = self.dump_slice(leaked);
                            write!(self.writer, "{}", hex::dump(shown))?;
                            if shown.len() < leaked.len() {
                                writeln!(
                                    self.writer,
                                    "... {} more bytes not shown",
                                    leaked.len() - shown.len()
                                )?;
                            }
                        }
                    }
                    ProbeOutcome::Safe(observation) => {
                        writeln!(self.writer, "Host {host}:{port} is safe ({observation})")?;
                    }
                    ProbeOutcome::Indeterminate { stage, reason } => {
                        writeln!(
                            self.writer,
                            "Host {host}:{port} did not respond as expected while {stage}: {reason}"
                        )?;
                    }
                }
            }
        }
        self.writer.flush()?;
        Ok(())
    }

    /// Reports a probe that produced no report.
    pub fn write_failure(&mut self, target: &TargetSpec, err: &ProbeError) -> anyhow::Result<()> {
        let summary = if err.is_configuration() {
            "invalid probe configuration"
        } else if err.is_unreachable() {
            "could not reach target"
        } else {
            "target did not respond as expected"
        };
        match self.cfg.format {
            OutputFormat::Jsonl => {
                let timestamp = crate::util::now_iso8601();
                let line = ReportLine {
                    host: &target.host,
                    ip: None,
                    port: target.port,
                    timestamp: &timestamp,
                    status: "error",
                    stage: None,
                    reason: Some(format!("{summary}: {err}")),
                    connect_ms: None,
                    handshake: None,
                    leaked_bytes: None,
                    leaked_hex: None,
                };
                writeln!(self.writer, "{}", serde_json::to_string(&line)?)?;
            }
            OutputFormat::Pretty => {
                writeln!(self.writer, "Host {target}: {summary}: {err}")?;
            }
        }
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> anyhow::Result<W> {
        self.writer
            .into_inner()
            .map_err(|err| anyhow::anyhow!("failed to flush report: {}", err.error()))
    }

    fn dump_slice<'a>(&self, leaked: &'a [u8]) -> &'a [u8] {
        match self.cfg.max_dump_bytes {
            Some(max) if max < leaked.len() => &leaked[..max],
            _ => leaked,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{EncodingError, TransportError};
    use crate::model::{ProbeStage, SafeObservation, TargetView};
    use std::time::Duration;

    fn report(outcome: ProbeOutcome) -> ProbeReport {
        ProbeReport {
            target: TargetView {
                host: "example.org".into(),
                addr: "192.0.2.7".into(),
                port: 443,
            },
            timestamp: "2014-04-08T00:00:00.000Z".into(),
            connect_ms: Some(12),
            handshake: Some(HandshakeSummary {
                records: 3,
                skipped_records: 0,
                message_types: vec![2, 11, 14],
            }),
            outcome,
        }
    }

    fn render(cfg: OutputConfig, report: &ProbeReport) -> String {
        let mut sink = OutputSink::new(cfg, Vec::new());
        sink.write_report(report).unwrap();
        String::from_utf8(sink.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn pretty_vulnerable_includes_dump() {
        let text = render(
            OutputConfig::default(),
            &report(ProbeOutcome::Vulnerable {
                leaked: b"secret-cookie=1234567890".to_vec(),
            }),
        );
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Host example.org:443 is vulnerable! Heartbeat response payload: 24 bytes"
        );
        assert!(lines.next().unwrap().ends_with("|secret-cookie=12|"));
        assert!(lines.next().unwrap().ends_with("|34567890|"));
    }

    #[test]
    fn pretty_dump_respects_cap() {
        let cfg = OutputConfig {
            max_dump_bytes: Some(16),
            ..OutputConfig::default()
        };
        let text = render(cfg, &report(ProbeOutcome::Vulnerable { leaked: vec![0x41; 40] }));
        assert_eq!(text.lines().count(), 3);
        assert!(text.ends_with("... 24 more bytes not shown\n"));
    }

    #[test]
    fn pretty_safe_and_indeterminate() {
        let safe = render(
            OutputConfig::default(),
            &report(ProbeOutcome::Safe(SafeObservation::NotHeartbeat { content_type: 21 })),
        );
        assert_eq!(
            safe,
            "Host example.org:443 is safe (no heartbeat response (content type 21))\n"
        );

        let unknown = render(
            OutputConfig::default(),
            &report(ProbeOutcome::Indeterminate {
                stage: ProbeStage::Heartbeating,
                reason: "connection closed by peer".into(),
            }),
        );
        assert!(unknown.contains("did not respond as expected while heartbeating"));
    }

    #[test]
    fn jsonl_vulnerable_line() {
        let cfg = OutputConfig {
            format: OutputFormat::Jsonl,
            ..OutputConfig::default()
        };
        let leaked = vec![0xde, 0xad, 0xbe, 0xef];
        let text = render(cfg, &report(ProbeOutcome::Vulnerable { leaked }));
        let value: serde_json::Value = serde_json::from_str(text.trim()).unwrap();
        assert_eq!(value["status"], "vulnerable");
        assert_eq!(value["leaked_bytes"], 4);
        assert_eq!(value["leaked_hex"], "deadbeef");
        assert_eq!(value["ip"], "192.0.2.7");
        assert_eq!(value["handshake"]["message_types"], serde_json::json!([2, 11, 14]));
    }

    #[test]
    fn jsonl_omits_dump_when_disabled() {
        let cfg = OutputConfig {
            format: OutputFormat::Jsonl,
            dump: false,
            max_dump_bytes: None,
        };
        let text = render(cfg, &report(ProbeOutcome::Vulnerable { leaked: vec![1; 8] }));
        let value: serde_json::Value = serde_json::from_str(text.trim()).unwrap();
        assert_eq!(value["leaked_bytes"], 8);
        assert!(value.get("leaked_hex").is_none());
    }

    #[test]
    fn failure_distinguishes_unreachable() {
        let target = TargetSpec {
            host: "example.org".into(),
            port: 443,
        };
        let unresolved = ProbeError::from(TransportError::Resolve {
            host: "example.org".into(),
        });
        let timed_out = ProbeError::from(TransportError::Timeout(Duration::from_secs(15)));
        let oversized = ProbeError::from(EncodingError::RecordTooLarge(0x1_0003));

        let mut sink = OutputSink::new(OutputConfig::default(), Vec::new());
        sink.write_failure(&target, &unresolved).unwrap();
        sink.write_failure(&target, &timed_out).unwrap();
        sink.write_failure(&target, &oversized).unwrap();
        let text = String::from_utf8(sink.into_inner().unwrap()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "Host example.org:443: could not reach target: could not resolve example.org"
        );
        assert!(lines[1].starts_with("Host example.org:443: target did not respond as expected"));
        assert_eq!(
            lines[2],
            "Host example.org:443: invalid probe configuration: \
             record payload of 65539 bytes exceeds 65535"
        );
    }

    #[test]
    fn jsonl_failure_names_configuration_errors() {
        let cfg = OutputConfig {
            format: OutputFormat::Jsonl,
            ..OutputConfig::default()
        };
        let target = TargetSpec {
            host: "127.0.0.1".into(),
            port: 9,
        };
        let mut sink = OutputSink::new(cfg, Vec::new());
        sink.write_failure(&target, &ProbeError::from(EncodingError::EmptyCatalog))
            .unwrap();
        let text = String::from_utf8(sink.into_inner().unwrap()).unwrap();
        let value: serde_json::Value = serde_json::from_str(text.trim()).unwrap();
        assert_eq!(value["status"], "error");
        assert_eq!(
            value["reason"],
            "invalid probe configuration: cipher-suite catalog is empty"
        );
    }
}
