//! Kubernetes core/v1 client for pod binding and deletion.
//!
//! Talks plain HTTP/1.1 to an API server address. Authentication and
//! TLS are expected to be handled by a `kubectl proxy` sidecar; a bearer
//! token can still be attached for proxies that forward it.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http::{Method, StatusCode};
use http_body_util::{BodyExt, Full};
use serde_json::json;
use tracing::{debug, info};

use flowbind_core::{HostId, WorkloadId};

use crate::error::{OrchestratorError, OrchestratorResult};
use crate::Orchestrator;

/// [`Orchestrator`] backed by the Kubernetes REST API.
#[derive(Debug, Clone)]
pub struct KubeOrchestrator {
    address: String,
    token: Option<String>,
    timeout: Duration,
}

impl KubeOrchestrator {
    /// Client for the API server at `address` (`host:port`).
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            token: None,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Send one request on a fresh connection and collect the response.
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> OrchestratorResult<(StatusCode, Bytes)> {
        let mut builder = http::Request::builder()
            .method(method)
            .uri(path)
            .header("host", &self.address)
            .header("accept", "application/json")
            .header("user-agent", "flowbind/0.1");
        if body.is_some() {
            builder = builder.header("content-type", "application/json");
        }
        if let Some(ref token) = self.token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = builder
            .body(Full::new(Bytes::from(body.unwrap_or_default())))
            .map_err(|e| OrchestratorError::Request(e.to_string()))?;

        let transport = |reason: String| OrchestratorError::Transport {
            address: self.address.clone(),
            reason,
        };

        let exchange = async {
            let stream = tokio::net::TcpStream::connect(&self.address)
                .await
                .map_err(|e| transport(format!("connect: {e}")))?;

            let io = hyper_util::rt::TokioIo::new(stream);
            let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
                .await
                .map_err(|e| transport(format!("handshake: {e}")))?;

            // Drive the connection in the background.
            tokio::spawn(async move {
                let _ = conn.await;
            });

            let response = sender
                .send_request(request)
                .await
                .map_err(|e| transport(format!("request: {e}")))?;
            let status = response.status();
            let body = response
                .into_body()
                .collect()
                .await
                .map_err(|e| transport(format!("read body: {e}")))?
                .to_bytes();
            Ok::<_, OrchestratorError>((status, body))
        };

        tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| transport(format!("timed out after {:?}", self.timeout)))?
    }
}

#[async_trait]
impl Orchestrator for KubeOrchestrator {
    async fn bind_workload_to_host(
        &self,
        workload: &WorkloadId,
        host: &HostId,
    ) -> OrchestratorResult<()> {
        let path = binding_path(workload);
        let body = serde_json::to_vec(&binding_body(workload, host))
            .map_err(|e| OrchestratorError::Request(e.to_string()))?;

        let (status, body) = self.send(Method::POST, &path, Some(body)).await?;
        if !status.is_success() {
            return Err(rejected("bind", status, &body));
        }

        info!(%workload, %host, "workload bound");
        Ok(())
    }

    async fn remove_workload(&self, workload: &WorkloadId) -> OrchestratorResult<()> {
        let path = pod_path(workload);
        let (status, body) = self.send(Method::DELETE, &path, None).await?;

        if status == StatusCode::NOT_FOUND {
            debug!(%workload, "workload already gone");
            return Ok(());
        }
        if !status.is_success() {
            return Err(rejected("delete", status, &body));
        }

        info!(%workload, "workload deleted");
        Ok(())
    }
}

fn pod_path(workload: &WorkloadId) -> String {
    format!(
        "/api/v1/namespaces/{}/pods/{}",
        workload.namespace, workload.name
    )
}

fn binding_path(workload: &WorkloadId) -> String {
    format!("{}/binding", pod_path(workload))
}

fn binding_body(workload: &WorkloadId, host: &HostId) -> serde_json::Value {
    json!({
        "apiVersion": "v1",
        "kind": "Binding",
        "metadata": {
            "name": workload.name,
            "namespace": workload.namespace,
        },
        "target": {
            "apiVersion": "v1",
            "kind": "Node",
            "name": host.as_str(),
        },
    })
}

fn rejected(action: &'static str, status: StatusCode, body: &Bytes) -> OrchestratorError {
    OrchestratorError::Rejected {
        action,
        status: status.as_u16(),
        body: String::from_utf8_lossy(body).into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_follow_core_v1_layout() {
        let workload = WorkloadId::new("nsA", "podA");
        assert_eq!(pod_path(&workload), "/api/v1/namespaces/nsA/pods/podA");
        assert_eq!(
            binding_path(&workload),
            "/api/v1/namespaces/nsA/pods/podA/binding"
        );
    }

    #[test]
    fn binding_targets_the_node() {
        let body = binding_body(&WorkloadId::new("nsA", "podA"), &HostId::from("nodeX"));
        assert_eq!(body["kind"], "Binding");
        assert_eq!(body["metadata"]["name"], "podA");
        assert_eq!(body["metadata"]["namespace"], "nsA");
        assert_eq!(body["target"]["kind"], "Node");
        assert_eq!(body["target"]["name"], "nodeX");
    }

    #[tokio::test]
    async fn unreachable_api_server_is_transport_error() {
        let kube = KubeOrchestrator::new("127.0.0.1:1").with_timeout(Duration::from_millis(200));
        let result = kube.remove_workload(&WorkloadId::new("ns", "pod")).await;
        assert!(matches!(result, Err(OrchestratorError::Transport { .. })));
    }
}
