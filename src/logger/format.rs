//! Access log line formats
//!
//! `combined` and `common` follow the Apache/Nginx layouts, `json` emits one
//! object per line, and anything else is treated as a `$variable` pattern.

use chrono::{DateTime, Local};

const CLF_TIME: &str = "%d/%b/%Y:%H:%M:%S %z";

/// One served request, as recorded in the access log
#[derive(Debug, Clone)]
pub struct AccessLogEntry {
    pub remote_addr: String,
    pub time: DateTime<Local>,
    pub method: String,
    pub path: String,
    /// Raw query string, without the leading `?`
    pub query: Option<String>,
    /// Set once the dispatcher has seen a non-empty action name
    pub action: Option<String>,
    pub http_version: String,
    pub status: u16,
    pub body_bytes: usize,
    pub referer: Option<String>,
    pub user_agent: Option<String>,
    pub request_time_us: u64,
}

impl AccessLogEntry {
    /// Start an entry stamped with the current local time
    pub fn new(remote_addr: String, method: String, path: String) -> Self {
        Self {
            remote_addr,
            time: Local::now(),
            method,
            path,
            query: None,
            action: None,
            http_version: "1.1".to_string(),
            status: 200,
            body_bytes: 0,
            referer: None,
            user_agent: None,
            request_time_us: 0,
        }
    }

    pub fn format(&self, format: &str) -> String {
        match format {
            "combined" => format!(
                "{} \"{}\" \"{}\"",
                self.common_line(),
                dash(self.referer.as_deref()),
                dash(self.user_agent.as_deref()),
            ),
            "common" => self.common_line(),
            "json" => self.json_line(),
            pattern => self.expand(pattern),
        }
    }

    fn request_uri(&self) -> String {
        match &self.query {
            Some(q) => format!("{}?{q}", self.path),
            None => self.path.clone(),
        }
    }

    fn request_line(&self) -> String {
        format!("{} {} HTTP/{}", self.method, self.request_uri(), self.http_version)
    }

    /// Seconds with millisecond precision, as nginx prints `$request_time`
    fn request_seconds(&self) -> String {
        format!(
            "{}.{:03}",
            self.request_time_us / 1_000_000,
            (self.request_time_us % 1_000_000) / 1_000
        )
    }

    fn common_line(&self) -> String {
        format!(
            "{} - - [{}] \"{}\" {} {}",
            self.remote_addr,
            self.time.format(CLF_TIME),
            self.request_line(),
            self.status,
            self.body_bytes,
        )
    }

    fn json_line(&self) -> String {
        serde_json::json!({
            "remote_addr": self.remote_addr,
            "time": self.time.to_rfc3339(),
            "method": self.method,
            "path": self.path,
            "query": self.query,
            "action": self.action,
            "http_version": self.http_version,
            "status": self.status,
            "body_bytes": self.body_bytes,
            "referer": self.referer,
            "user_agent": self.user_agent,
            "request_time_us": self.request_time_us,
        })
        .to_string()
    }

    /// Substitute `$variable` names in a custom pattern.
    ///
    /// Known variables: `$remote_addr`, `$time_local`, `$time_iso8601`,
    /// `$request`, `$request_method`, `$request_uri`, `$request_time`,
    /// `$status`, `$body_bytes_sent`, `$http_referer`, `$http_user_agent`
    /// and `$action`. Unknown names are left as written.
    fn expand(&self, pattern: &str) -> String {
        // Longer names first so `$request_uri` is not read as `$request`
        let vars: [(&str, String); 12] = [
            ("$body_bytes_sent", self.body_bytes.to_string()),
            ("$http_user_agent", dash(self.user_agent.as_deref()).to_string()),
            ("$request_method", self.method.clone()),
            ("$http_referer", dash(self.referer.as_deref()).to_string()),
            ("$time_iso8601", self.time.to_rfc3339()),
            ("$request_time", self.request_seconds()),
            ("$remote_addr", self.remote_addr.clone()),
            ("$request_uri", self.request_uri()),
            ("$time_local", self.time.format(CLF_TIME).to_string()),
            ("$request", self.request_line()),
            ("$status", self.status.to_string()),
            ("$action", dash(self.action.as_deref()).to_string()),
        ];

        let mut out = String::with_capacity(pattern.len() * 2);
        let mut rest = pattern;
        while let Some(pos) = rest.find('$') {
            out.push_str(&rest[..pos]);
            rest = &rest[pos..];
            match vars.iter().find(|(name, _)| rest.starts_with(name)) {
                Some((name, value)) => {
                    out.push_str(value);
                    rest = &rest[name.len()..];
                }
                None => {
                    out.push('$');
                    rest = &rest[1..];
                }
            }
        }
        out.push_str(rest);
        out
    }
}

fn dash(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}
