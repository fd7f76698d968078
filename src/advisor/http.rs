//! HTTP advisor client

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::errors::AdvisorError;
use crate::domain::model::{ContentDescriptor, ParameterOverrides, ParameterSet};
use crate::ports::ParameterAdvisor;

/// Request body sent to the advisor service
#[derive(Debug, Serialize)]
struct AdvisorRequest<'a> {
    descriptor: &'a ContentDescriptor,
    baseline: &'a ParameterSet,
}

/// Advisor service response. Only `encoding_recommendations` is consumed;
/// anything else the service returns is ignored.
#[derive(Debug, Deserialize)]
struct AdvisorResponse {
    #[serde(default)]
    encoding_recommendations: Recommendations,
}

#[derive(Debug, Default, Deserialize)]
struct Recommendations {
    #[serde(default)]
    codec_parameters: BTreeMap<String, serde_json::Value>,
    bitrate_strategy: Option<BitrateStrategy>,
    #[serde(default)]
    ffmpeg_options: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct BitrateStrategy {
    #[serde(rename = "type")]
    kind: String,
    value: serde_json::Value,
}

/// Client for an external parameter-recommendation service
pub struct HttpAdvisor {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpAdvisor {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Flatten a recommendation payload into parameter overrides
    fn to_overrides(recommendations: Recommendations) -> ParameterOverrides {
        let mut overrides = ParameterOverrides::default();

        for (key, value) in recommendations.codec_parameters {
            overrides.video.insert(key, Self::stringify(&value));
        }

        if let Some(strategy) = recommendations.bitrate_strategy {
            let value = Self::stringify(&strategy.value);
            match strategy.kind.to_uppercase().as_str() {
                "CRF" => {
                    overrides.video.insert("crf".to_string(), value);
                }
                "CBR" => {
                    overrides.video.insert("bitrate".to_string(), value.clone());
                    overrides.video.insert("minrate".to_string(), value.clone());
                    overrides.video.insert("maxrate".to_string(), value.clone());
                    if let Some(bufsize) = Self::doubled_rate(&value) {
                        overrides.video.insert("bufsize".to_string(), bufsize);
                    }
                }
                "VBR" => {
                    overrides.video.insert("bitrate".to_string(), value);
                }
                _ => {}
            }
        }

        overrides.extra_args = recommendations.ffmpeg_options;
        overrides
    }

    fn stringify(value: &serde_json::Value) -> String {
        match value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// Double a rate like "4000k" for CBR buffer sizing
    fn doubled_rate(rate: &str) -> Option<String> {
        let digits = rate.trim_end_matches(|c: char| c.is_ascii_alphabetic());
        let suffix = &rate[digits.len()..];
        let value: u64 = digits.parse().ok()?;
        Some(format!("{}{}", value * 2, suffix))
    }
}

#[async_trait]
impl ParameterAdvisor for HttpAdvisor {
    async fn advise(
        &self,
        descriptor: &ContentDescriptor,
        baseline: &ParameterSet,
    ) -> Result<ParameterOverrides, AdvisorError> {
        let body = AdvisorRequest {
            descriptor,
            baseline,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| AdvisorError::Transport {
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(AdvisorError::Transport {
                message: format!("Advisor returned HTTP {}", response.status()),
            });
        }

        let payload: AdvisorResponse =
            response
                .json()
                .await
                .map_err(|e| AdvisorError::MalformedResponse {
                    message: e.to_string(),
                })?;

        Ok(Self::to_overrides(payload.encoding_recommendations))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crf_strategy_maps_to_crf_override() {
        let payload: AdvisorResponse = serde_json::from_str(
            r#"{"encoding_recommendations": {
                "codec_parameters": {"preset": "slow"},
                "bitrate_strategy": {"type": "CRF", "value": 19},
                "ffmpeg_options": ["-tune", "film"]
            }}"#,
        )
        .unwrap();

        let overrides = HttpAdvisor::to_overrides(payload.encoding_recommendations);
        assert_eq!(overrides.video.get("preset").unwrap(), "slow");
        assert_eq!(overrides.video.get("crf").unwrap(), "19");
        assert_eq!(overrides.extra_args, vec!["-tune", "film"]);
    }

    #[test]
    fn test_cbr_strategy_pins_rates_and_doubles_bufsize() {
        let payload: AdvisorResponse = serde_json::from_str(
            r#"{"encoding_recommendations": {
                "bitrate_strategy": {"type": "CBR", "value": "4000k"}
            }}"#,
        )
        .unwrap();

        let overrides = HttpAdvisor::to_overrides(payload.encoding_recommendations);
        assert_eq!(overrides.video.get("bitrate").unwrap(), "4000k");
        assert_eq!(overrides.video.get("minrate").unwrap(), "4000k");
        assert_eq!(overrides.video.get("maxrate").unwrap(), "4000k");
        assert_eq!(overrides.video.get("bufsize").unwrap(), "8000k");
    }

    #[test]
    fn test_empty_response_yields_empty_overrides() {
        let payload: AdvisorResponse = serde_json::from_str("{}").unwrap();
        let overrides = HttpAdvisor::to_overrides(payload.encoding_recommendations);
        assert!(overrides.is_empty());
    }

    #[test]
    fn test_unknown_strategy_is_ignored() {
        let payload: AdvisorResponse = serde_json::from_str(
            r#"{"encoding_recommendations": {
                "bitrate_strategy": {"type": "ABR", "value": "2M"}
            }}"#,
        )
        .unwrap();
        let overrides = HttpAdvisor::to_overrides(payload.encoding_recommendations);
        assert!(overrides.video.is_empty());
    }
}
