//! Shared fixtures: an in-process block explorer plus sample contracts

#![allow(dead_code)]

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use honeypot_scan::{AppConfig, Chain};
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

/// Two `tx.origin` traps: inside `balanceOf` and inside `transfer`
pub const TRAP_SOURCE: &str = r#"// SPDX-License-Identifier: MIT
pragma solidity ^0.8.0;

contract Token {
    string public symbol = "TRAP";
    mapping(address => uint256) private _balances;
    address private _owner;

    function balanceOf(address account) public view returns (uint256) {
        address caller = tx.origin;
        return caller == _owner ? _balances[account] : 0;
    }

    function transfer(address to, uint256 amount) public returns (bool) {
        address caller = tx.origin;
        _balances[caller] -= amount;
        _balances[to] += amount;
        return true;
    }
}
"#;

pub const CLEAN_SOURCE: &str = r#"// SPDX-License-Identifier: MIT
pragma solidity ^0.8.0;

contract Token {
    string public symbol = "FAIR";
    mapping(address => uint256) private _balances;

    function balanceOf(address account) public view returns (uint256) {
        return _balances[account];
    }

    function transfer(address to, uint256 amount) public returns (bool) {
        require(_balances[msg.sender] >= amount, "insufficient balance");
        _balances[msg.sender] -= amount;
        _balances[to] += amount;
        return true;
    }
}
"#;

/// Deployed on the mock chain with trap source
pub const TRAP_ADDRESS: &str = "0x1111111111111111111111111111111111111111";
/// Deployed on the mock chain with clean source
pub const CLEAN_ADDRESS: &str = "0x2222222222222222222222222222222222222222";
/// Deployed, but the explorer has no verified source
pub const UNVERIFIED_ADDRESS: &str = "0x3333333333333333333333333333333333333333";
/// No bytecode on any chain
pub const UNDEPLOYED_ADDRESS: &str = "0x4444444444444444444444444444444444444444";

/// Chain the mock reports bytecode on
pub const DEPLOYED_CHAIN: Chain = Chain::Polygon;

/// Explorer key behaviour: `bad1` answers HTTP 500, `bad2` answers an API
/// error, `good` answers with source. Any other key is rejected for source
/// calls but accepted for bytecode lookups.
pub const GOOD_KEY: &str = "good";
/// Rate limited on every action
pub const EXHAUSTED_KEY: &str = "exhausted";

#[derive(Default)]
struct MockState {
    probe_calls: AtomicUsize,
    source_calls: AtomicUsize,
}

pub struct MockExplorer {
    pub base_url: String,
    state: Arc<MockState>,
}

impl MockExplorer {
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());
        let app = Router::new()
            .route("/api", get(explorer))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}/api", addr),
            state,
        }
    }

    pub fn probe_calls(&self) -> usize {
        self.state.probe_calls.load(Ordering::SeqCst)
    }

    pub fn source_calls(&self) -> usize {
        self.state.source_calls.load(Ordering::SeqCst)
    }

    /// App config pointed at this explorer
    pub fn config(&self, keys: &[&str]) -> AppConfig {
        let mut config = AppConfig::default();
        config.explorer.base_url = self.base_url.clone();
        config.explorer.api_keys = keys.iter().map(|k| k.to_string()).collect();
        config.explorer.request_timeout = Duration::from_secs(5);
        config.explorer.probe_timeout = Duration::from_secs(5);
        config.explorer.key_backoff = Duration::from_millis(50);
        config
    }
}

async fn explorer(
    State(state): State<Arc<MockState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let param = |key: &str| params.get(key).map(String::as_str).unwrap_or_default();
    let address = param("address");

    if param("apikey") == EXHAUSTED_KEY {
        match param("action") {
            "eth_getCode" => state.probe_calls.fetch_add(1, Ordering::SeqCst),
            _ => state.source_calls.fetch_add(1, Ordering::SeqCst),
        };
        return Json(json!({
            "status": "0",
            "message": "NOTOK",
            "result": "Max rate limit reached"
        }))
        .into_response();
    }

    match param("action") {
        "eth_getCode" => {
            state.probe_calls.fetch_add(1, Ordering::SeqCst);
            let deployed = param("chainid") == DEPLOYED_CHAIN.chain_id().to_string()
                && address != UNDEPLOYED_ADDRESS;
            let code = if deployed { "0x6080604052" } else { "0x" };
            Json(json!({ "jsonrpc": "2.0", "id": 1, "result": code })).into_response()
        }
        "getsourcecode" => {
            state.source_calls.fetch_add(1, Ordering::SeqCst);
            match param("apikey") {
                "bad1" => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
                "bad2" => Json(json!({
                    "status": "0",
                    "message": "NOTOK",
                    "result": "Invalid API Key"
                }))
                .into_response(),
                GOOD_KEY => {
                    let source = if address == TRAP_ADDRESS {
                        TRAP_SOURCE
                    } else if address == CLEAN_ADDRESS {
                        CLEAN_SOURCE
                    } else {
                        ""
                    };
                    Json(json!({
                        "status": "1",
                        "message": "OK",
                        "result": [{
                            "SourceCode": source,
                            "ContractName": "Token",
                            "CompilerVersion": "v0.8.19+commit.7dd6d404"
                        }]
                    }))
                    .into_response()
                }
                _ => Json(json!({
                    "status": "0",
                    "message": "NOTOK",
                    "result": "Missing/Invalid API Key"
                }))
                .into_response(),
            }
        }
        _ => StatusCode::BAD_REQUEST.into_response(),
    }
}
