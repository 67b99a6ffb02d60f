//! Minimal HTTP/1.1 stub server for exercising the blocking HTTP clients.

use std::collections::VecDeque;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;

#[derive(Debug, Clone)]
pub(crate) struct Recorded {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Recorded {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Clone)]
struct Reply {
    status: u16,
    body: Vec<u8>,
}

struct Route {
    method: &'static str,
    path: String,
    // The last reply repeats once the queue is down to one.
    replies: VecDeque<Reply>,
}

pub(crate) struct StubServer {
    listener: TcpListener,
    routes: Vec<Route>,
}

impl StubServer {
    pub fn bind() -> StubServer {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        StubServer {
            listener,
            routes: Vec::new(),
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.listener.local_addr().unwrap())
    }

    /// Queue a reply for `method path`. Repeated calls for the same route
    /// are served in order.
    pub fn route(mut self, method: &'static str, path: &str, status: u16, body: impl Into<Vec<u8>>) -> Self {
        let reply = Reply {
            status,
            body: body.into(),
        };
        match self
            .routes
            .iter_mut()
            .find(|r| r.method == method && r.path == path)
        {
            Some(route) => route.replies.push_back(reply),
            None => self.routes.push(Route {
                method,
                path: path.to_string(),
                replies: VecDeque::from([reply]),
            }),
        }
        self
    }

    /// Serve on a background thread; returns the log of received requests.
    pub fn start(self) -> Arc<Mutex<Vec<Recorded>>> {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&requests);
        let StubServer { listener, mut routes } = self;
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { continue };
                let _ = serve(stream, &mut routes, &log);
            }
        });
        requests
    }
}

fn serve(stream: TcpStream, routes: &mut [Route], log: &Mutex<Vec<Recorded>>) -> io::Result<()> {
    let mut reader = BufReader::new(stream.try_clone()?);
    let mut line = String::new();
    reader.read_line(&mut line)?;
    let mut parts = line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let path = parts.next().unwrap_or_default().to_string();

    let mut headers = Vec::new();
    loop {
        let mut header = String::new();
        reader.read_line(&mut header)?;
        let header = header.trim_end();
        if header.is_empty() {
            break;
        }
        if let Some((name, value)) = header.split_once(':') {
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }
    }

    let request = Recorded {
        method,
        path,
        headers,
        body: Vec::new(),
    };
    let body = read_body(&mut reader, &request)?;
    let request = Recorded { body, ..request };

    let reply = routes
        .iter_mut()
        .find(|r| r.method == request.method && r.path == request.path)
        .and_then(|r| {
            if r.replies.len() > 1 {
                r.replies.pop_front()
            } else {
                r.replies.front().cloned()
            }
        })
        .unwrap_or(Reply {
            status: 404,
            body: b"no route".to_vec(),
        });
    log.lock().unwrap().push(request);

    let content_type = if reply.body.first() == Some(&b'{') {
        "application/json"
    } else {
        "text/plain"
    };
    let mut out = stream;
    write!(
        out,
        "HTTP/1.1 {} Stub\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        reply.status,
        reply.body.len()
    )?;
    out.write_all(&reply.body)?;
    out.flush()
}

fn read_body(reader: &mut BufReader<TcpStream>, request: &Recorded) -> io::Result<Vec<u8>> {
    if let Some(length) = request.header("content-length") {
        let mut body = vec![0; length.parse().unwrap_or(0)];
        reader.read_exact(&mut body)?;
        return Ok(body);
    }
    let chunked = request
        .header("transfer-encoding")
        .is_some_and(|v| v.eq_ignore_ascii_case("chunked"));
    let mut body = Vec::new();
    if chunked {
        loop {
            let mut size = String::new();
            reader.read_line(&mut size)?;
            let size = usize::from_str_radix(size.trim(), 16).unwrap_or(0);
            let mut chunk = vec![0; size + 2];
            if size == 0 {
                let mut trailer = String::new();
                reader.read_line(&mut trailer)?;
                break;
            }
            reader.read_exact(&mut chunk)?;
            body.extend_from_slice(&chunk[..size]);
        }
    }
    Ok(body)
}
