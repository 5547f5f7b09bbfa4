//! SIEM export: render a set of receipts into one of a closed set of
//! formats, with AND-combined filtering and offset/limit pagination.
//!
//! Rendering is pure — it takes receipts, returns a string body plus
//! content-type metadata, and never touches storage or the chain.

use std::fmt;
use std::str::FromStr;

use serde_json::{json, Value};
use trustledger_core::TrustReceipt;

use crate::error::{LedgerError, Result};

/// The supported export formats. Closed set; unknown names are rejected
/// at parse time rather than falling back to a default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Single JSON document with an export envelope.
    Json,
    /// Newline-delimited JSON, envelope on the first line.
    JsonLines,
    /// RFC 4180 CSV with a fixed column set.
    Csv,
    /// Splunk HEC-friendly `key=value` lines with the raw receipt attached.
    Splunk,
    /// Datadog log intake: one JSON object per line with `ddsource`/`ddtags`.
    Datadog,
    /// Elasticsearch bulk API: alternating action and document lines.
    ElasticBulk,
}

impl ExportFormat {
    /// Parse a format name as it appears in a request or CLI flag.
    pub fn parse(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "jsonl" | "jsonlines" | "ndjson" => Ok(Self::JsonLines),
            "csv" => Ok(Self::Csv),
            "splunk" => Ok(Self::Splunk),
            "datadog" => Ok(Self::Datadog),
            "elastic" | "elastic-bulk" | "elasticsearch" => Ok(Self::ElasticBulk),
            other => Err(LedgerError::UnsupportedFormat(other.to_string())),
        }
    }

    /// MIME type for the rendered body.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::JsonLines => "application/x-ndjson",
            Self::Csv => "text/csv",
            Self::Splunk => "text/plain",
            Self::Datadog => "application/x-ndjson",
            Self::ElasticBulk => "application/x-ndjson",
        }
    }

    /// Suggested file extension, without the dot.
    pub fn file_extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::JsonLines => "jsonl",
            Self::Csv => "csv",
            Self::Splunk => "log",
            Self::Datadog => "ndjson",
            Self::ElasticBulk => "ndjson",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Json => "json",
            Self::JsonLines => "jsonl",
            Self::Csv => "csv",
            Self::Splunk => "splunk",
            Self::Datadog => "datadog",
            Self::ElasticBulk => "elastic-bulk",
        };
        f.write_str(name)
    }
}

/// Receipt selection criteria. Every populated field must match for a
/// receipt to be included (AND semantics). Fields reaching into the opaque
/// payloads (`telemetry`, `policy_state`, `metadata`) treat a missing path
/// as a non-match.
#[derive(Debug, Clone, Default)]
pub struct ExportFilter {
    pub session_id: Option<String>,
    pub agent_did: Option<String>,
    pub human_did: Option<String>,
    /// Inclusive RFC 3339 lower bound on `timestamp`.
    pub since: Option<String>,
    /// Inclusive RFC 3339 upper bound on `timestamp`.
    pub until: Option<String>,
    /// Minimum `telemetry.trust_score`.
    pub min_trust_score: Option<f64>,
    /// Maximum `telemetry.cost_debt`.
    pub max_cost_debt: Option<f64>,
    /// When true, require a non-empty `policy_state.violations` array.
    pub has_violations: Option<bool>,
    /// Required value of `metadata.consent_verified`.
    pub consent_verified: Option<bool>,
    /// Receipt's `metadata.tags` must contain every listed tag.
    pub tags: Vec<String>,
}

impl ExportFilter {
    /// True when the receipt satisfies every populated criterion.
    pub fn matches(&self, receipt: &TrustReceipt) -> bool {
        if let Some(session_id) = &self.session_id {
            if &receipt.session_id != session_id {
                return false;
            }
        }
        if let Some(agent_did) = &self.agent_did {
            if &receipt.agent_did != agent_did {
                return false;
            }
        }
        if let Some(human_did) = &self.human_did {
            if &receipt.human_did != human_did {
                return false;
            }
        }
        // Fixed-format UTC timestamps compare correctly as strings.
        if let Some(since) = &self.since {
            if receipt.timestamp.as_str() < since.as_str() {
                return false;
            }
        }
        if let Some(until) = &self.until {
            if receipt.timestamp.as_str() > until.as_str() {
                return false;
            }
        }
        if let Some(min) = self.min_trust_score {
            match payload_f64(receipt.telemetry.as_ref(), "trust_score") {
                Some(score) if score >= min => {}
                _ => return false,
            }
        }
        if let Some(max) = self.max_cost_debt {
            match payload_f64(receipt.telemetry.as_ref(), "cost_debt") {
                Some(debt) if debt <= max => {}
                _ => return false,
            }
        }
        if let Some(wanted) = self.has_violations {
            let present = payload_field(receipt.policy_state.as_ref(), "violations")
                .and_then(Value::as_array)
                .map(|a| !a.is_empty())
                .unwrap_or(false);
            if present != wanted {
                return false;
            }
        }
        if let Some(wanted) = self.consent_verified {
            match payload_field(receipt.metadata.as_ref(), "consent_verified")
                .and_then(Value::as_bool)
            {
                Some(actual) if actual == wanted => {}
                _ => return false,
            }
        }
        if !self.tags.is_empty() {
            let receipt_tags = extract_tags(receipt);
            if !self.tags.iter().all(|t| receipt_tags.contains(t)) {
                return false;
            }
        }
        true
    }
}

/// Offset/limit window applied after filtering.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pagination {
    pub offset: usize,
    /// Maximum number of receipts to render; `None` means unbounded.
    pub limit: Option<usize>,
}

/// A rendered export: the body plus the content metadata a transport
/// layer needs to serve or write it.
#[derive(Debug, Clone)]
pub struct ExportOutput {
    pub body: String,
    pub mime_type: &'static str,
    pub file_extension: &'static str,
    /// How many receipts made it into the body after filter + pagination.
    pub record_count: usize,
}

/// Filter, paginate, and render receipts in the requested format.
pub fn export_receipts(
    receipts: &[TrustReceipt],
    format: ExportFormat,
    filter: &ExportFilter,
    page: Pagination,
) -> Result<ExportOutput> {
    let selected: Vec<&TrustReceipt> = receipts
        .iter()
        .filter(|r| filter.matches(r))
        .skip(page.offset)
        .take(page.limit.unwrap_or(usize::MAX))
        .collect();

    let body = match format {
        ExportFormat::Json => render_json(&selected)?,
        ExportFormat::JsonLines => render_jsonl(&selected)?,
        ExportFormat::Csv => render_csv(&selected),
        ExportFormat::Splunk => render_splunk(&selected)?,
        ExportFormat::Datadog => render_datadog(&selected)?,
        ExportFormat::ElasticBulk => render_elastic(&selected)?,
    };

    Ok(ExportOutput {
        body,
        mime_type: format.mime_type(),
        file_extension: format.file_extension(),
        record_count: selected.len(),
    })
}

fn export_envelope(count: usize) -> Value {
    json!({
        "export_version": "1.0",
        "generated_at": chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        "record_count": count,
    })
}

fn to_value(receipt: &TrustReceipt) -> Result<Value> {
    serde_json::to_value(receipt).map_err(|e| LedgerError::Render(e.to_string()))
}

fn render_json(receipts: &[&TrustReceipt]) -> Result<String> {
    let mut envelope = export_envelope(receipts.len());
    let records: Vec<Value> = receipts
        .iter()
        .map(|r| to_value(r))
        .collect::<Result<_>>()?;
    envelope["receipts"] = Value::Array(records);
    serde_json::to_string_pretty(&envelope).map_err(|e| LedgerError::Render(e.to_string()))
}

fn render_jsonl(receipts: &[&TrustReceipt]) -> Result<String> {
    let mut lines = Vec::with_capacity(receipts.len() + 1);
    lines.push(
        serde_json::to_string(&export_envelope(receipts.len()))
            .map_err(|e| LedgerError::Render(e.to_string()))?,
    );
    for receipt in receipts {
        lines.push(
            serde_json::to_string(receipt).map_err(|e| LedgerError::Render(e.to_string()))?,
        );
    }
    Ok(lines.join("\n") + "\n")
}

const CSV_HEADER: &str = "id,timestamp,session_id,agent_did,human_did,policy_version,mode,model,provider,trust_score,chain_length,tags";

fn render_csv(receipts: &[&TrustReceipt]) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for receipt in receipts {
        let trust_score = payload_f64(receipt.telemetry.as_ref(), "trust_score")
            .map(|s| s.to_string())
            .unwrap_or_default();
        let tags = extract_tags(receipt).join(";");
        let fields = [
            receipt.id.as_str(),
            receipt.timestamp.as_str(),
            receipt.session_id.as_str(),
            receipt.agent_did.as_str(),
            receipt.human_did.as_str(),
            receipt.policy_version.as_str(),
            receipt.mode.as_str(),
            receipt.interaction.model.as_str(),
            receipt.interaction.provider.as_str(),
            trust_score.as_str(),
            &receipt.chain.chain_length.to_string(),
            tags.as_str(),
        ]
        .map(csv_field);
        out.push_str(&fields.join(","));
        out.push('\n');
    }
    out
}

// RFC 4180: quote when the field contains a comma, quote, or newline;
// embedded quotes are doubled.
fn csv_field(raw: &str) -> String {
    if raw.contains(',') || raw.contains('"') || raw.contains('\n') || raw.contains('\r') {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

fn render_splunk(receipts: &[&TrustReceipt]) -> Result<String> {
    let mut out = String::new();
    for receipt in receipts {
        let raw = serde_json::to_string(receipt).map_err(|e| LedgerError::Render(e.to_string()))?;
        let trust_score = payload_f64(receipt.telemetry.as_ref(), "trust_score")
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!(
            "timestamp={} receipt_id={} session_id={} agent_did={} mode={} trust_score={} chain_length={} raw={}\n",
            receipt.timestamp,
            receipt.id,
            splunk_value(&receipt.session_id),
            splunk_value(&receipt.agent_did),
            splunk_value(&receipt.mode),
            trust_score,
            receipt.chain.chain_length,
            splunk_value(&raw),
        ));
    }
    Ok(out)
}

fn splunk_value(raw: &str) -> String {
    if raw.contains(' ') || raw.contains('=') || raw.contains('"') {
        format!("\"{}\"", raw.replace('"', "\\\""))
    } else {
        raw.to_string()
    }
}

fn render_datadog(receipts: &[&TrustReceipt]) -> Result<String> {
    let mut out = String::new();
    for receipt in receipts {
        let mut ddtags = vec![
            format!("session_id:{}", receipt.session_id),
            format!("agent_did:{}", receipt.agent_did),
            format!("mode:{}", receipt.mode),
        ];
        ddtags.extend(extract_tags(receipt));
        let event = json!({
            "ddsource": "trustledger",
            "ddtags": ddtags.join(","),
            "service": "trust-receipts",
            "timestamp": receipt.timestamp,
            "message": to_value(receipt)?,
        });
        out.push_str(&serde_json::to_string(&event).map_err(|e| LedgerError::Render(e.to_string()))?);
        out.push('\n');
    }
    Ok(out)
}

const ELASTIC_INDEX: &str = "trust-receipts";

fn render_elastic(receipts: &[&TrustReceipt]) -> Result<String> {
    let mut out = String::new();
    for receipt in receipts {
        let action = json!({"index": {"_index": ELASTIC_INDEX, "_id": receipt.id}});
        out.push_str(
            &serde_json::to_string(&action).map_err(|e| LedgerError::Render(e.to_string()))?,
        );
        out.push('\n');
        out.push_str(
            &serde_json::to_string(receipt).map_err(|e| LedgerError::Render(e.to_string()))?,
        );
        out.push('\n');
    }
    Ok(out)
}

fn payload_field<'a>(payload: Option<&'a Value>, key: &str) -> Option<&'a Value> {
    payload?.as_object()?.get(key)
}

fn payload_f64(payload: Option<&Value>, key: &str) -> Option<f64> {
    payload_field(payload, key)?.as_f64()
}

fn extract_tags(receipt: &TrustReceipt) -> Vec<String> {
    payload_field(receipt.metadata.as_ref(), "tags")
        .and_then(Value::as_array)
        .map(|tags| {
            tags.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
