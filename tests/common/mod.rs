#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Status code that makes the stub accept the request and never answer.
pub const HANG: u16 = 0;

#[derive(Debug, Clone)]
pub struct Route {
    pub method: &'static str,
    pub path: &'static str,
    pub status: u16,
    pub body: String,
}

pub fn route(
    method: &'static str,
    path: &'static str,
    status: u16,
    body: impl Into<String>,
) -> Route {
    Route {
        method,
        path,
        status,
        body: body.into(),
    }
}

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub query: String,
    pub body: String,
}

impl Recorded {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

pub struct StubServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl StubServer {
    pub async fn start(routes: Vec<Route>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&requests);
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    return;
                };
                let routes = routes.clone();
                let seen = Arc::clone(&seen);
                tokio::spawn(async move {
                    serve(stream, &routes, &seen).await;
                });
            }
        });
        Self { base_url, requests }
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

async fn serve(mut stream: TcpStream, routes: &[Route], seen: &Mutex<Vec<Recorded>>) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        let n = stream.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };
    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let content_length = head
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())
                .flatten()
        })
        .unwrap_or(0);
    while buf.len() < header_end + content_length {
        let n = stream.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let request_line = head.lines().next().unwrap_or_default();
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let target = parts.next().unwrap_or_default();
    let (path, query) = target.split_once('?').unwrap_or((target, ""));
    let body = String::from_utf8_lossy(&buf[header_end..]).to_string();
    seen.lock().unwrap().push(Recorded {
        method: method.clone(),
        path: path.to_string(),
        query: query.to_string(),
        body,
    });

    let matched = routes
        .iter()
        .find(|r| r.method == method && r.path == path)
        .cloned()
        .unwrap_or_else(|| route("ANY", "", 404, r#"{"detail":"Not Found"}"#));
    if matched.status == HANG {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        return;
    }
    let response = format!(
        "HTTP/1.1 {} Stub\r\nContent-Type: application/json\r\n\
         Content-Length: {}\r\nConnection: close\r\n\r\n{}",
        matched.status,
        matched.body.len(),
        matched.body
    );
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}

pub fn file_info_json(relative_path: &str, language: &str, priority: i64) -> serde_json::Value {
    let filename = relative_path.rsplit('/').next().unwrap_or(relative_path);
    serde_json::json!({
        "path": format!("/tmp/clone/{relative_path}"),
        "relative_path": relative_path,
        "filename": filename,
        "language": language,
        "size": 512,
        "is_executable": true,
        "priority": priority
    })
}

pub fn file_result_json(relative_path: &str, language: &str, score: f64) -> serde_json::Value {
    serde_json::json!({
        "file_info": file_info_json(relative_path, language, 1),
        "content": "def main():\n    pass\n",
        "ai_score": score,
        "complexity_analysis": {
            "time_complexity": "O(n)",
            "space_complexity": "O(1)",
            "optimization_level": "Good",
            "complexity_score": 75.0,
            "explanation": "linear scan"
        },
        "quality_metrics": {
            "syntax_score": 100.0,
            "readability_score": 80.0,
            "maintainability_score": 70.0,
            "duplicate_code_penalty": 0.0,
            "best_practices_score": 65.0,
            "overall_quality_score": 78.0
        },
        "ai_insights": "Readable.",
        "recommendations": "Add docstrings.",
        "analysis_timestamp": "2024-05-01T12:00:00"
    })
}

pub fn analysis_json(repo_url: &str, path: &str) -> String {
    serde_json::json!({
        "repository_url": repo_url,
        "analyzed_file_found": true,
        "analyzed_file_path": path,
        "analyzed_file_content": "print('hello')\n",
        "analyzed_file_language": "Python",
        "all_files": [file_info_json(path, "Python", 1)],
        "execution_result": {
            "success": true,
            "output": "hello\n",
            "error": "",
            "execution_time": 0.12,
            "exit_code": 0
        },
        "ai_score": 84.0,
        "ai_insights": "Clean entry point.",
        "recommendations": "Add tests."
    })
    .to_string()
}
