// Session descriptions exchanged by hand between the two peers
// Stand-in for a signaling server: the text is copied from one screen and pasted into the other

use serde::{Deserialize, Serialize};

use super::error::ConnectionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdpType {
    Offer,
    Answer,
}

impl SdpType {
    /// Human label shown in front of the JSON payload
    pub fn label(self) -> &'static str {
        match self {
            SdpType::Offer => "Offer",
            SdpType::Answer => "Answer",
        }
    }
}

/// Tagged description blob, immutable once created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescription {
    #[serde(rename = "type")]
    pub sdp_type: SdpType,
    pub sdp: String,
}

impl SessionDescription {
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            sdp_type: SdpType::Offer,
            sdp: sdp.into(),
        }
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            sdp_type: SdpType::Answer,
            sdp: sdp.into(),
        }
    }

    /// Bare JSON, the form placed on the clipboard
    pub fn to_text(&self) -> Result<String, ConnectionError> {
        Ok(serde_json::to_string(self)?)
    }

    /// JSON with its human label, e.g. `Offer: {...}`
    pub fn to_labelled_text(&self) -> Result<String, ConnectionError> {
        Ok(format!("{}: {}", self.sdp_type.label(), self.to_text()?))
    }

    /// Parse pasted text. Anything before the first `{` is a label and is skipped.
    pub fn parse(text: &str) -> Result<Self, ConnectionError> {
        let start = text
            .find('{')
            .ok_or_else(|| ConnectionError::Parse("no description found in pasted text".to_string()))?;
        Ok(serde_json::from_str(text[start..].trim_end())?)
    }

    /// Parse and require a particular type tag
    pub fn parse_expecting(text: &str, expected: SdpType) -> Result<Self, ConnectionError> {
        let description = Self::parse(text)?;
        if description.sdp_type != expected {
            return Err(ConnectionError::Parse(format!(
                "expected an {}, got an {}",
                expected.label().to_lowercase(),
                description.sdp_type.label().to_lowercase()
            )));
        }
        Ok(description)
    }

    /// Number of ICE candidates carried in the SDP body
    pub fn candidate_count(&self) -> usize {
        self.sdp
            .lines()
            .filter(|l| l.starts_with("a=candidate:"))
            .count()
    }
}
