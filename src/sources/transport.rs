use std::time::Duration;

use serde_json::Value;

use crate::config::HttpConfig;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// 원격 API 요청 한 건.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub form: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl ApiRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::Post, url)
    }

    fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            form: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn form(mut self, key: &str, value: impl ToString) -> Self {
        self.form.push((key.to_string(), value.to_string()));
        self
    }

    pub fn header(mut self, key: &str, value: impl ToString) -> Self {
        self.headers.push((key.to_string(), value.to_string()));
        self
    }

    pub fn body(mut self, body: String) -> Self {
        self.body = Some(body);
        self
    }

    /// 쿼리 파라미터 값을 찾는다.
    #[cfg(test)]
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// 폼 파라미터 값을 찾는다.
    #[cfg(test)]
    pub fn form_value(&self, key: &str) -> Option<&str> {
        self.form
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// HTTP 왕복을 맡는 외부 협력자.
/// 재시도나 캐시 없이 요청 한 번에 응답 한 번을 돌려준다.
pub trait Transport {
    /// 요청을 보내고 응답 본문을 JSON으로 해석한다.
    fn send_json(&self, request: &ApiRequest) -> Result<Value>;

    /// URL의 내용을 그대로 내려받는다.
    fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>>;
}

/// reqwest blocking 클라이언트 기반 전송 계층.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn send_json(&self, request: &ApiRequest) -> Result<Value> {
        log::debug!("{:?} {}", request.method, request.url);

        let mut builder = match request.method {
            Method::Get => self.client.get(request.url.as_str()),
            Method::Post => self.client.post(request.url.as_str()),
        };
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        if !request.form.is_empty() {
            builder = builder.form(&request.form);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let resp = builder.send()?;
        if !resp.status().is_success() {
            log::warn!("{} 응답 상태: {}", request.url, resp.status());
        }
        let text = resp.error_for_status()?.text()?;

        serde_json::from_str(&text).map_err(|e| {
            Error::RemoteFailure(format!("JSON 디코딩 실패: {}. 원본 응답:\n{}", e, text))
        })
    }

    fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        log::debug!("GET {}", url);

        let data = self
            .client
            .get(url)
            .send()?
            .error_for_status()?
            .bytes()?
            .to_vec();

        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let req = ApiRequest::post("https://example.com/api")
            .query("a", 1)
            .form("s", "晴天")
            .header("Referer", "https://example.com/");

        assert_eq!(req.method, Method::Post);
        assert_eq!(req.query_value("a"), Some("1"));
        assert_eq!(req.form_value("s"), Some("晴天"));
        assert_eq!(req.form_value("missing"), None);
        assert_eq!(req.headers.len(), 1);
        assert!(req.body.is_none());
    }
}
