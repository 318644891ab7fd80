//! Total derivatives and their response layouts.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{require_session_id, ToolError};
use crate::model::{ModelError, Totals};
use crate::session::SessionStore;

/// Layout of the returned jacobian.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnFormat {
    /// `{of: {wrt: value}}`
    #[default]
    ByPair,
    /// `{of: [...], wrt: [...], data: [[...]]}`, rows follow `of`.
    Dense,
}

#[derive(Debug, Clone, Serialize)]
pub struct TotalsOutput {
    pub jacobian: Map<String, Value>,
    pub messages: Vec<String>,
}

/// Compute d`of`/d`wrt` for every pair and reshape into `format`.
pub fn compute_totals(
    store: &SessionStore,
    session_id: &str,
    of: &[String],
    wrt: &[String],
    format: ReturnFormat,
) -> Result<TotalsOutput, ToolError> {
    require_session_id(session_id)?;
    if of.is_empty() || wrt.is_empty() {
        return Err(ToolError::validation("of and wrt must be provided"));
    }

    let session = store.get(session_id)?;
    let totals = session.model().compute_totals(of, wrt)?;
    tracing::debug!(session_id, pairs = totals.len(), ?format, "totals computed");

    let jacobian = match format {
        ReturnFormat::ByPair => by_pair(&totals, of, wrt)?,
        ReturnFormat::Dense => dense(&totals, of, wrt)?,
    };

    Ok(TotalsOutput {
        jacobian,
        messages: vec!["Totals computed".to_string()],
    })
}

fn cell<'a>(totals: &'a Totals, of: &str, wrt: &str) -> Result<&'a Value, ModelError> {
    totals.get(&(of.to_string(), wrt.to_string())).ok_or_else(|| {
        ModelError::derivative(format!("No derivative of '{}' wrt '{}'", of, wrt))
    })
}

fn by_pair(
    totals: &Totals,
    of: &[String],
    wrt: &[String],
) -> Result<Map<String, Value>, ModelError> {
    let mut jacobian = Map::new();
    for o in of {
        let mut row = Map::new();
        for w in wrt {
            row.insert(w.clone(), cell(totals, o, w)?.clone());
        }
        jacobian.insert(o.clone(), Value::Object(row));
    }
    Ok(jacobian)
}

fn dense(
    totals: &Totals,
    of: &[String],
    wrt: &[String],
) -> Result<Map<String, Value>, ModelError> {
    let mut data = Vec::with_capacity(of.len());
    for o in of {
        let row = wrt
            .iter()
            .map(|w| cell(totals, o, w).cloned())
            .collect::<Result<Vec<_>, _>>()?;
        data.push(Value::Array(row));
    }

    let mut jacobian = Map::new();
    jacobian.insert("of".to_string(), Value::from(of.to_vec()));
    jacobian.insert("wrt".to_string(), Value::from(wrt.to_vec()));
    jacobian.insert("data".to_string(), Value::Array(data));
    Ok(jacobian)
}
