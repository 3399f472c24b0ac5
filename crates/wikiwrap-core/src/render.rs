use wikiwrap_types::{BatchReceipt, DocumentStatus};

/// Render a receipt as terminal text: warnings first, then one line per
/// changed, failed, or cancelled document, then a totals line. Unchanged
/// documents are omitted from the listing; they only appear in the totals.
pub fn render_summary(receipt: &BatchReceipt) -> String {
    let mut out = String::new();

    for warning in &receipt.warnings {
        out.push_str(&format!(
            "warning: rule '{}' ({}): {}\n",
            warning.rule,
            warning.kind.as_str(),
            warning.detail
        ));
    }

    for doc in &receipt.documents {
        match doc.status {
            DocumentStatus::Changed => {
                out.push_str(&format!(
                    "changed   {} (+{} link(s))\n",
                    doc.name, doc.links_added
                ));
            }
            DocumentStatus::Failed => {
                let detail = doc.error.as_deref().unwrap_or("unknown error");
                out.push_str(&format!("failed    {}: {}\n", doc.name, detail));
            }
            DocumentStatus::Cancelled => {
                out.push_str(&format!("cancelled {}\n", doc.name));
            }
            DocumentStatus::Unchanged => {}
        }
    }

    let totals = &receipt.totals;
    out.push_str(&format!(
        "{} document(s): {} changed, {} unchanged, {} failed",
        totals.total, totals.changed, totals.unchanged, totals.failed
    ));
    if totals.cancelled > 0 {
        out.push_str(&format!(", {} cancelled", totals.cancelled));
    }
    out.push_str(&format!(", {} link(s) added\n", totals.links_added));

    out
}

/// Serialize a receipt for machine consumption.
pub fn render_json(receipt: &BatchReceipt) -> Result<String, anyhow::Error> {
    Ok(serde_json::to_string_pretty(receipt)?)
}
