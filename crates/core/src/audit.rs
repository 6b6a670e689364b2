#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

/// Typed audit payloads; each kind carries exactly the fields it needs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuditEvent {
    UserCreated {
        user_id: i64,
        username: String,
        role: String,
    },
    ProductCreated {
        product_id: i64,
        sku: String,
        name: String,
    },
    StockAdjusted {
        product_id: i64,
        delta: i64,
        reason: String,
    },
    CustodyAssigned {
        record_id: i64,
        product_id: i64,
        custodian_id: i64,
    },
    CustodyReturned {
        record_id: i64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        condition_note: Option<String>,
    },
    CustodyTransferred {
        record_id: i64,
        from_custodian_id: i64,
        to_custodian_id: i64,
    },
    SaleRecorded {
        sale_id: i64,
        total_cents: i64,
        item_count: u32,
    },
    SchemaMigrated {
        from_version: u32,
        to_version: u32,
        applied: Vec<u32>,
    },
}

impl AuditEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UserCreated { .. } => "user_created",
            Self::ProductCreated { .. } => "product_created",
            Self::StockAdjusted { .. } => "stock_adjusted",
            Self::CustodyAssigned { .. } => "custody_assigned",
            Self::CustodyReturned { .. } => "custody_returned",
            Self::CustodyTransferred { .. } => "custody_transferred",
            Self::SaleRecorded { .. } => "sale_recorded",
            Self::SchemaMigrated { .. } => "schema_migrated",
        }
    }

    pub fn to_payload_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decodes a stored row; the `kind` column must agree with the payload's tag.
    pub fn from_record(kind: &str, payload_json: &str) -> Result<Self, AuditDecodeError> {
        let event: AuditEvent =
            serde_json::from_str(payload_json).map_err(|err| AuditDecodeError::Payload {
                kind: kind.to_string(),
                message: err.to_string(),
            })?;
        if event.kind() != kind {
            return Err(AuditDecodeError::KindMismatch {
                column: kind.to_string(),
                payload: event.kind().to_string(),
            });
        }
        Ok(event)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuditDecodeError {
    Payload { kind: String, message: String },
    KindMismatch { column: String, payload: String },
}

impl std::fmt::Display for AuditDecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Payload { kind, message } => {
                write!(f, "invalid {kind} audit payload: {message}")
            }
            Self::KindMismatch { column, payload } => write!(
                f,
                "audit kind mismatch (column={column}, payload={payload})"
            ),
        }
    }
}

impl std::error::Error for AuditDecodeError {}
