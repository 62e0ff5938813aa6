//! Shared helpers for rexsl integration tests

use std::fs;
use std::io::{Read, Write};
use std::net::{Ipv4Addr, TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use rexsl::{Environment, RexslConfig};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

pub const WEB_XML_DOC: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<web-app xmlns="http://java.sun.com/xml/ns/javaee" version="3.0">
  <display-name>sample</display-name>
</web-app>
"#;

pub const PAGE: &str = r#"<?xml version="1.0"?>
<?xml-stylesheet type="text/xsl" href="/xsl/layout.xsl"?>
<page><title>Home</title></page>
"#;

pub const INDEX_HTML: &str = r#"<html><head>
<link rel="stylesheet" href="/css/screen.css"/>
</head><body><a href="/about.html">About</a></body></html>
"#;

pub const VALID_SOAP: &str = r#"<env:Envelope xmlns:env="http://www.w3.org/2003/05/soap-envelope">
  <env:Body>
    <m:cssvalidationresponse xmlns:m="http://www.w3.org/2005/07/css-validator">
      <m:validity>true</m:validity>
    </m:cssvalidationresponse>
  </env:Body>
</env:Envelope>"#;

/// Write `content` to `root/rel`, creating parent directories.
pub fn write(root: &Path, rel: &str, content: &str) -> PathBuf {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent dir");
    }
    fs::write(&path, content).expect("Failed to write file");
    path
}

/// Build a jar at `root/rel` holding the given entries.
pub fn jar(root: &Path, rel: &str, entries: &[&str]) -> PathBuf {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent dir");
    }
    let file = fs::File::create(&path).expect("Failed to create jar");
    let mut zip = ZipWriter::new(file);
    for entry in entries {
        zip.start_file(*entry, SimpleFileOptions::default())
            .expect("Failed to start jar entry");
        zip.write_all(b"\xca\xfe\xba\xbe").expect("Failed to write jar entry");
    }
    zip.finish().expect("Failed to finish jar");
    path
}

/// A project that passes every check.
///
/// Sources live under `src/`, the packaged webapp under `target/webapp`.
pub fn valid_project() -> TempDir {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let root = temp.path();

    write(root, "src/main/webapp/WEB-INF/web.xml", WEB_XML_DOC);
    write(root, "src/main/webapp/xsl/layout.xsl", "<xsl:stylesheet version=\"2.0\"/>\n");
    write(root, "src/main/webapp/css/screen.css", "body { color: #333; }\na { color: red; }\n");
    write(root, "src/main/webapp/js/app.js", "function hello(name) { return 'hi ' + name; }\n");
    write(root, "src/main/webapp/index.html", INDEX_HTML);

    write(root, "src/test/rexsl/xml/index.xml", PAGE);
    write(
        root,
        "src/test/rexsl/xhtml/index.sh",
        "grep -q '<title>Home</title>' \"$REXSL_DOCUMENT\"\n",
    );
    write(root, "src/test/rexsl/xsd/page.xsd", "<xs:schema xmlns:xs=\"http://www.w3.org/2001/XMLSchema\"/>\n");
    write(root, "src/test/rexsl/scripts/home.sh", "test -n \"$REXSL_HOME\"\n");

    write(root, "target/webapp/index.html", INDEX_HTML);
    write(root, "target/webapp/about.html", "<html><body>About</body></html>\n");
    write(root, "target/webapp/css/screen.css", "body { color: #333; }\n");
    jar(root, "target/webapp/WEB-INF/lib/alpha.jar", &["com/example/Alpha.class"]);
    jar(root, "target/webapp/WEB-INF/lib/beta.jar", &["com/example/Beta.class"]);

    temp
}

/// Environment over `basedir` with a freshly reserved port.
pub fn environment(basedir: &Path) -> Environment {
    Environment::builder(basedir)
        .port(0)
        .build()
        .expect("Failed to build environment")
}

/// Default configuration with the Jigsaw service pointed at `url`.
pub fn config_with_jigsaw(url: &str) -> RexslConfig {
    let mut config = RexslConfig::default();
    config.jigsaw.url = url.to_string();
    config.http.retry_delay_ms = 0;
    config
}

/// A local HTTP server answering with scripted replies.
///
/// Each connection gets the next `(status, body)` pair; the last one
/// repeats. Returns the base URL and a counter of requests served.
pub fn scripted_server(replies: Vec<(u16, String)>) -> (String, Arc<AtomicUsize>) {
    let (url, hits, _) = recording_server(replies);
    (url, hits)
}

/// Like [`scripted_server`], also keeping the raw bytes of every request.
pub fn recording_server(
    replies: Vec<(u16, String)>,
) -> (String, Arc<AtomicUsize>, Arc<Mutex<Vec<Vec<u8>>>>) {
    assert!(!replies.is_empty(), "scripted server needs at least one reply");
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).expect("Failed to bind");
    let port = listener.local_addr().expect("Failed to read address").port();
    let hits = Arc::new(AtomicUsize::new(0));
    let requests = Arc::new(Mutex::new(Vec::new()));
    let served = Arc::clone(&hits);
    let recorded = Arc::clone(&requests);
    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { continue };
            let index = served.fetch_add(1, Ordering::SeqCst);
            let (status, body) = &replies[index.min(replies.len() - 1)];
            let raw = drain_request(&mut stream);
            recorded.lock().expect("Request log poisoned").push(raw);
            let reply = format!(
                "HTTP/1.1 {status} Scripted\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(reply.as_bytes());
            let _ = stream.flush();
        }
    });
    (format!("http://127.0.0.1:{port}/"), hits, requests)
}

/// Read headers and a `Content-Length` body so the client sees a clean close.
fn drain_request(stream: &mut TcpStream) -> Vec<u8> {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 1024];
    let header_end = loop {
        match stream.read(&mut chunk) {
            Ok(0) | Err(_) => return buffer,
            Ok(n) => buffer.extend_from_slice(&chunk[..n]),
        }
        if let Some(pos) = buffer.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };
    let headers = String::from_utf8_lossy(&buffer[..header_end]).to_lowercase();
    let length = headers
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(0);
    while buffer.len() < header_end + length {
        match stream.read(&mut chunk) {
            Ok(0) | Err(_) => break,
            Ok(n) => buffer.extend_from_slice(&chunk[..n]),
        }
    }
    buffer
}
