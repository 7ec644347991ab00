//! Static log corpora used across harnesses.
//!
//! Each corpus is a `&'static [&'static str]` of representative lines.

/// Caddy JSON access-log lines, default `time_format` (float seconds).
pub const CORPUS_CADDY: &[&str] = &[
    r#"{"level":"info","ts":1706788852.6825173,"logger":"http.log.access","msg":"handled request","request":{"remote_addr":"1.2.3.4:41844","proto":"HTTP/2.0","method":"HEAD","host":"host.example.com","uri":"/path.html","headers":{"User-Agent":["Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36"]}},"duration":0.000455129,"size":0,"status":304,"resp_headers":{}}"#,
    r#"{"level":"info","ts":1706788853.7180748,"logger":"http.log.access","msg":"handled request","request":{"remote_addr":"1.2.3.4:41844","proto":"HTTP/2.0","method":"HEAD","host":"host.example.com","uri":"/path.html","headers":{"Accept-Language":["ru-RU,ru;q=0.9,en-US;q=0.8,en;q=0.7"]}},"duration":0.000356122,"size":0,"status":304,"resp_headers":{}}"#,
    r#"{"level":"info","ts":1706788854.7159958,"logger":"http.log.access","msg":"handled request","request":{"remote_addr":"5.6.7.8:51000","proto":"HTTP/1.1","method":"GET","host":"blog.example.com","uri":"/posts/1?utm_source=feed","headers":{"User-Agent":["Googlebot/2.1 (+http://www.google.com/bot.html)"],"Referer":["https://example.org/","https://second.example.org/"],"X-Forwarded-For":["10.1.1.1, 10.2.2.2"]}},"duration":0.012,"size":5120,"status":200,"resp_headers":{"Content-Type":["text/html"]}}"#,
    r#"{"level":"info","ts":1706788855.7197819,"logger":"http.log.access","msg":"handled request","request":{"remote_addr":"5.6.7.8:51000","proto":"HTTP/1.1","method":"GET","host":"static.example.com","uri":"/img/logo.png","headers":{"User-Agent":["curl/8.5.0"]}},"duration":0.0004,"size":20480,"status":200,"resp_headers":{}}"#,
];

/// Apache/nginx combined-format lines.
pub const CORPUS_COMBINED: &[&str] = &[
    r#"127.0.0.1 - frank [10/Oct/2000:13:55:36 -0700] "GET /apache_pb.gif HTTP/1.0" 200 2326 "http://www.example.com/start.html" "Mozilla/4.08 [en] (Win98; I ;Nav)""#,
    r#"192.168.1.20 - - [15/Jan/2024:10:00:00 +0000] "POST /api/v1/orders HTTP/1.1" 201 512 "-" "curl/8.5.0""#,
    r#"2001:db8::1 - - [15/Jan/2024:10:00:01 +0100] "GET /index.html?lang=en HTTP/2.0" 304 - "https://example.org/" "Mozilla/5.0 (compatible; bingbot/2.0)""#,
    r#"10.0.0.7 - - [15/Jan/2024:10:00:02 +0000] "GET /healthz HTTP/1.1" 200 2 "-" "kube-probe/1.29""#,
];

/// Lines that do not follow the combined format at all.
pub const CORPUS_GARBAGE: &[&str] = &[
    "",
    "hello world",
    r#"127.0.0.1 - - [15/Jan/2024:10:00:00 +0000] "GET / HTTP/1.1" OK 12 "-" "-""#,
    "{\"ts\":1.5}",
];

/// Generate `n` synthetic Caddy lines for throughput checks.
pub fn caddy_high_volume(n: usize) -> Vec<String> {
    (0..n)
        .map(|i| {
            let status = match i % 10 {
                0 => 500,
                1 | 2 => 404,
                _ => 200,
            };
            serde_json::json!({
                "ts": 1_706_788_852.0 + i as f64,
                "duration": 0.001,
                "size": i,
                "status": status,
                "request": {
                    "remote_addr": format!("10.0.{}.{}:443", i / 256 % 256, i % 256),
                    "proto": "HTTP/1.1",
                    "method": "GET",
                    "host": format!("site{}.example.com", i % 3),
                    "uri": format!("/page/{i}?n={i}"),
                    "headers": {}
                }
            })
            .to_string()
        })
        .collect()
}
