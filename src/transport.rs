//! Carrying `search` and `plot` calls to the data server.

use crate::{dispatcher::RemoteCall, error::PeakViewError};
use peakview_protocol::{
    GeneRecord, PlotReply, PlotRequest, PlotResult, RemoteError, SearchReply, SearchRequest,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{collections::VecDeque, fs, time::Duration};
use tracing::debug;

pub trait Transport {
    fn search(&mut self, request: &SearchRequest) -> Result<Vec<GeneRecord>, RemoteError>;
    fn plot(&mut self, request: &PlotRequest) -> Result<PlotResult, RemoteError>;
}

/// JSON over HTTP: `POST {base}/search` and `POST {base}/plot`.
pub struct HttpTransport {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, PeakViewError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| format!("could not build HTTP client: {e}"))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn post<Req: Serialize, Reply: DeserializeOwned>(
        &self,
        call: &str,
        request: &Req,
    ) -> Result<Reply, RemoteError> {
        let endpoint = format!("{}/{call}", self.base_url);
        debug!(endpoint = endpoint.as_str(), "posting request");
        let response = self
            .client
            .post(&endpoint)
            .json(request)
            .send()
            .map_err(|e| RemoteError::transport(format!("{call} request failed at {endpoint}: {e}")))?;
        let status = response.status();
        let body = response
            .text()
            .map_err(|e| RemoteError::transport(format!("could not read {call} response body: {e}")))?;
        if !status.is_success() {
            return Err(RemoteError::transport(format!(
                "{call} failed at {endpoint} (status={status}): {}",
                body.trim()
            )));
        }
        serde_json::from_str(&body)
            .map_err(|e| RemoteError::decode(format!("{call} reply is not valid JSON: {e}")))
    }
}

impl Transport for HttpTransport {
    fn search(&mut self, request: &SearchRequest) -> Result<Vec<GeneRecord>, RemoteError> {
        self.post::<_, SearchReply>("search", request)?.into_result()
    }

    fn plot(&mut self, request: &PlotRequest) -> Result<PlotResult, RemoteError> {
        self.post::<_, PlotReply>("plot", request)?.into_result()
    }
}

/// Canned replies, handed out in order per call kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayScript {
    pub search: VecDeque<SearchReply>,
    pub plot: VecDeque<PlotReply>,
}

/// Answers from a [`ReplayScript`] and records every call it receives.
#[derive(Debug, Clone, Default)]
pub struct ReplayTransport {
    script: ReplayScript,
    calls: Vec<RemoteCall>,
}

impl ReplayTransport {
    pub fn new(script: ReplayScript) -> Self {
        Self {
            script,
            calls: vec![],
        }
    }

    pub fn from_json_file(path: &str) -> Result<Self, PeakViewError> {
        let text = fs::read_to_string(path)
            .map_err(|e| format!("Could not read replay script '{path}': {e}"))?;
        let script = serde_json::from_str(&text)
            .map_err(|e| format!("Could not parse replay script '{path}': {e}"))?;
        Ok(Self::new(script))
    }

    pub fn push_search(&mut self, reply: SearchReply) {
        self.script.search.push_back(reply);
    }

    pub fn push_plot(&mut self, reply: PlotReply) {
        self.script.plot.push_back(reply);
    }

    pub fn calls(&self) -> &[RemoteCall] {
        &self.calls
    }
}

impl Transport for ReplayTransport {
    fn search(&mut self, request: &SearchRequest) -> Result<Vec<GeneRecord>, RemoteError> {
        self.calls.push(RemoteCall::Search(request.clone()));
        self.script
            .search
            .pop_front()
            .ok_or_else(|| RemoteError::transport("no scripted search reply left"))?
            .into_result()
    }

    fn plot(&mut self, request: &PlotRequest) -> Result<PlotResult, RemoteError> {
        self.calls.push(RemoteCall::Plot(request.clone()));
        self.script
            .plot
            .pop_front()
            .ok_or_else(|| RemoteError::transport("no scripted plot reply left"))?
            .into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use peakview_protocol::{Action, BrowseMode, CollectionScope, ErrorCode};
    use std::io::Write;

    fn request() -> SearchRequest {
        SearchRequest {
            browse: BrowseMode::Global,
            collection: CollectionScope::All,
            action: Action::Intersection,
            datasets: vec!["D1".to_string(), "D2".to_string()],
        }
    }

    #[test]
    fn test_replay_hands_out_replies_in_order() {
        let mut transport = ReplayTransport::default();
        transport.push_search(SearchReply::ok(vec![GeneRecord::new("MDM2")]));
        transport.push_search(SearchReply {
            error: Some(serde_json::json!("database offline")),
            gene_list: None,
        });
        let genes = transport.search(&request()).unwrap();
        assert_eq!(genes[0].gene_name, "MDM2");
        let err = transport.search(&request()).unwrap_err();
        assert_eq!(err.code, ErrorCode::Remote);
        assert_eq!(err.message, "database offline");
        let err = transport.search(&request()).unwrap_err();
        assert_eq!(err.code, ErrorCode::Transport);
        assert_eq!(transport.calls().len(), 3);
    }

    #[test]
    fn test_replay_script_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"search":[{{"gene_list":[{{"gene_name":"BAX","D1":1}}]}}]}}"#
        )
        .unwrap();
        let mut transport =
            ReplayTransport::from_json_file(file.path().to_str().unwrap()).unwrap();
        let genes = transport.search(&request()).unwrap();
        assert!(genes[0].is_present_in("D1"));
        assert!(transport
            .plot(&PlotRequest {
                collection: CollectionScope::All,
                datasets: vec!["D1".to_string()],
                target: "BAX".to_string(),
                range: 20_000,
            })
            .is_err());
    }

    #[test]
    fn test_http_transport_trims_base_url() {
        let transport =
            HttpTransport::new("http://localhost:3000/", Duration::from_secs(1)).unwrap();
        assert_eq!(transport.base_url(), "http://localhost:3000");
    }
}
