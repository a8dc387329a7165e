//! End-to-end tests: a real hyper server speaking the Yar framing.
//!
//! The peer decodes each request with the packager named in its header,
//! hands the envelope to a test-supplied handler, and frames the handler's
//! response the same way a production server would.

use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;
use yar_client::prelude::*;
use yar_client::{HttpConfig, HttpTransport, Resolver, TransportError};
use yar_protocol::{
    Codec, Packager, PackagerName, ProtocolHeader, Request, Response, Status,
    frame, rmpv,
};

// =========================================================================
// Yar peer
// =========================================================================

/// What the peer does with a decoded request.
enum Reply {
    Envelope(Response),
    Bytes(Vec<u8>),
}

type Handler = dyn Fn(&ProtocolHeader, &Request) -> Reply + Send + Sync;

#[derive(Clone, Default)]
struct Seen(Arc<Mutex<Vec<Recorded>>>);

#[derive(Clone)]
struct Recorded {
    header: ProtocolHeader,
    request: Request,
    gzipped: bool,
}

impl Seen {
    fn count(&self) -> usize {
        self.0.lock().unwrap().len()
    }

    fn last(&self) -> Recorded {
        self.0.lock().unwrap().last().cloned().expect("peer saw a call")
    }
}

async fn start_peer(
    delay: Duration,
    handler: impl Fn(&ProtocolHeader, &Request) -> Reply + Send + Sync + 'static,
) -> (SocketAddr, Seen) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen = Seen::default();
    let handler: Arc<Handler> = Arc::new(handler);

    let recorder = seen.clone();
    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                break;
            };
            let handler = Arc::clone(&handler);
            let recorder = recorder.clone();
            tokio::spawn(async move {
                let service = service_fn(move |req: hyper::Request<Incoming>| {
                    let handler = Arc::clone(&handler);
                    let recorder = recorder.clone();
                    async move {
                        let (parts, body) = req.into_parts();
                        let body = body.collect().await?.to_bytes().to_vec();
                        let gzipped = has_gzip(&parts.headers, "content-encoding");
                        let accepts_gzip = has_gzip(&parts.headers, "accept-encoding");
                        let frame_bytes = if gzipped { gunzip(&body) } else { body };

                        let (header, payload) = frame::split(&frame_bytes).unwrap();
                        let name = PackagerName::from_configured(&header.packager_str());
                        let packager = Packager::from_name(&name).unwrap();
                        let request: Request = packager.decode(payload).unwrap();
                        recorder.0.lock().unwrap().push(Recorded {
                            header,
                            request: request.clone(),
                            gzipped,
                        });

                        tokio::time::sleep(delay).await;

                        let out = match handler(&header, &request) {
                            Reply::Envelope(response) => {
                                let mut reply_header =
                                    ProtocolHeader::new(header.magic_number, header.id);
                                reply_header.set_packager(&name);
                                let body = packager.encode(&response).unwrap();
                                frame::pack(&mut reply_header, &body).unwrap()
                            }
                            Reply::Bytes(bytes) => bytes,
                        };

                        let mut builder = hyper::Response::builder();
                        let out = if accepts_gzip {
                            builder = builder.header("content-encoding", "gzip");
                            gzip(&out)
                        } else {
                            out
                        };
                        Ok::<_, hyper::Error>(
                            builder.body(Full::new(Bytes::from(out))).unwrap(),
                        )
                    }
                });
                let _ = http1::Builder::new()
                    .serve_connection(TokioIo::new(stream), service)
                    .await;
            });
        }
    });

    (addr, seen)
}

fn has_gzip(headers: &hyper::HeaderMap, name: &str) -> bool {
    headers
        .get(name)
        .is_some_and(|v| v.as_bytes().eq_ignore_ascii_case(b"gzip"))
}

fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

fn gunzip(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    GzDecoder::new(data).read_to_end(&mut out).unwrap();
    out
}

/// Answers `Echo` with its first parameter and everything else with an
/// exception, like a small service would.
fn echo_service(_: &ProtocolHeader, request: &Request) -> Reply {
    let response = match request.method.as_str() {
        "Echo" => Response::success(
            request.id,
            request.params.first().cloned().unwrap_or(Value::Null),
        ),
        "Touch" => Response::success(request.id, Value::Null),
        other => Response::failure(
            request.id,
            Status::EXCEPTION,
            format!("method {other} not found"),
        ),
    };
    Reply::Envelope(response)
}

fn client_for(addr: SocketAddr, options: Options) -> Client {
    Client::new(format!("http://{addr}/rpc"))
        .unwrap()
        .with_options(options)
}

fn base_options() -> Options {
    Options::new()
        .with_provider("svcA")
        .with_credential("tokenX")
        .with_timeout(Duration::from_millis(2000))
}

// =========================================================================
// Successful calls
// =========================================================================

#[tokio::test]
async fn test_echo_round_trip() {
    let (addr, seen) = start_peer(Duration::ZERO, echo_service).await;
    let client = client_for(addr, base_options());

    let reply: String = client.call("Echo", params!["hi"]).await.unwrap();
    assert_eq!(reply, "hi");

    let recorded = seen.last();
    assert_eq!(recorded.header.provider_str(), "svcA");
    assert_eq!(recorded.header.token_str(), "tokenX");
    assert_eq!(recorded.header.packager_str(), "json");
    assert_eq!(recorded.header.magic_number, 0x80DF_EC60);
    assert_eq!(recorded.header.id, recorded.request.id);
    assert_eq!(recorded.request.method, "Echo");
    assert_eq!(recorded.request.params, vec![json!("hi")]);
    assert!(!recorded.gzipped);
}

#[tokio::test]
async fn test_struct_return_value() {
    #[derive(Debug, PartialEq, Deserialize)]
    struct User {
        name: String,
        age: u32,
    }

    let (addr, _) = start_peer(Duration::ZERO, |_, request| {
        Reply::Envelope(Response::success(
            request.id,
            json!({"name": "ada", "age": 36, "extra": true}),
        ))
    })
    .await;
    let client = client_for(addr, base_options());

    let user: User = client.call("GetUser", params![7]).await.unwrap();
    assert_eq!(
        user,
        User {
            name: "ada".into(),
            age: 36
        }
    );
}

#[tokio::test]
async fn test_msgpack_packager() {
    let (addr, seen) = start_peer(Duration::ZERO, echo_service).await;
    let client = client_for(addr, base_options().with_packager("msgpack"));

    let reply: Vec<i64> = client.call("Echo", params![[1, 2, 3]]).await.unwrap();
    assert_eq!(reply, vec![1, 2, 3]);
    assert_eq!(seen.last().header.packager_str(), "msgpack");
}

#[tokio::test]
async fn test_msgpack_sparse_array_return_value() {
    let (addr, _) = start_peer(Duration::ZERO, |header, request| {
        let sparse = rmpv::Value::Map(vec![(1.into(), "a".into()), (5.into(), "b".into())]);
        let response = Response::success(request.id, Value::Null).map_retval(|_| sparse);
        let mut reply_header = ProtocolHeader::new(header.magic_number, request.id);
        reply_header.set_packager(&PackagerName::from_configured("msgpack"));
        let body = Packager::MsgPack.encode(&response).unwrap();
        Reply::Bytes(frame::pack(&mut reply_header, &body).unwrap())
    })
    .await;
    let client = client_for(addr, base_options().with_packager("msgpack"));

    let reply: BTreeMap<u32, String> = client.call("Sparse", params![]).await.unwrap();
    assert_eq!(reply, BTreeMap::from([(1, "a".into()), (5, "b".into())]));
}

#[tokio::test]
async fn test_gzip_both_directions() {
    let (addr, seen) = start_peer(Duration::ZERO, echo_service).await;
    let options = base_options()
        .with_request_gzip(true)
        .with_accept_gzip(true);
    let client = client_for(addr, options);

    let long = "yar ".repeat(64);
    let reply: String = client.call("Echo", params![long.clone()]).await.unwrap();
    assert_eq!(reply, long);
    assert!(seen.last().gzipped);
}

#[tokio::test]
async fn test_invoke_discards_return_value() {
    let (addr, seen) = start_peer(Duration::ZERO, echo_service).await;
    let client = client_for(addr, base_options());

    client.invoke("Touch", params![]).await.unwrap();
    assert!(seen.last().request.params.is_empty());
}

#[tokio::test]
async fn test_concurrent_calls_share_a_client() {
    let (addr, seen) = start_peer(Duration::from_millis(20), echo_service).await;
    let client = Arc::new(client_for(addr, base_options()));

    let calls: Vec<_> = (0..8u32)
        .map(|i| {
            let client = Arc::clone(&client);
            tokio::spawn(async move { client.call::<u32>("Echo", params![i]).await })
        })
        .collect();
    for (i, call) in calls.into_iter().enumerate() {
        assert_eq!(call.await.unwrap().unwrap(), i as u32);
    }
    assert_eq!(seen.count(), 8);
}

// =========================================================================
// Failures before anything is sent
// =========================================================================

#[tokio::test]
async fn test_empty_method_is_param_error_and_sends_nothing() {
    let (addr, seen) = start_peer(Duration::ZERO, echo_service).await;
    let client = client_for(addr, base_options());

    let err = client.call::<Value>("", params![]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Param);
    assert_eq!(seen.count(), 0);
}

#[tokio::test]
async fn test_tcp_address_is_config_error() {
    let client = Client::new("tcp://10.0.0.7:9000")
        .unwrap()
        .with_options(base_options());
    let err = client.call::<Value>("Echo", params!["hi"]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
}

#[tokio::test]
async fn test_unknown_packager_sends_nothing() {
    let (addr, seen) = start_peer(Duration::ZERO, echo_service).await;
    let client = client_for(addr, base_options().with_packager("php"));

    let err = client.call::<Value>("Echo", params!["hi"]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Packager);
    assert_eq!(seen.count(), 0);
}

// =========================================================================
// Failures reported by or about the peer
// =========================================================================

#[tokio::test]
async fn test_failure_status_is_response_error() {
    let (addr, _) = start_peer(Duration::ZERO, echo_service).await;
    let client = client_for(addr, base_options());

    let err = client.call::<Value>("Missing", params![]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Response);
    assert!(err.to_string().contains("method Missing not found"));
    assert!(err.raw_response().is_some());
}

#[tokio::test]
async fn test_return_shape_mismatch_is_packager_error_with_raw() {
    let (addr, _) = start_peer(Duration::ZERO, echo_service).await;
    let client = client_for(addr, base_options());

    let err = client.call::<u64>("Echo", params!["not a number"]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Packager);
    let raw = err.raw_response().expect("raw reply kept");
    assert!(String::from_utf8_lossy(raw).contains("not a number"));
}

#[tokio::test]
async fn test_short_reply_is_response_error() {
    let (addr, _) = start_peer(Duration::ZERO, |_, _| {
        Reply::Bytes(b"502 bad gateway".to_vec())
    })
    .await;
    let client = client_for(addr, base_options());

    let err = client.call::<Value>("Echo", params!["hi"]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Response);
    assert!(err.to_string().contains("502 bad gateway"));
}

#[tokio::test]
async fn test_truncated_reply_is_response_error() {
    let (addr, _) = start_peer(Duration::ZERO, |header, request| {
        let mut reply_header = ProtocolHeader::new(header.magic_number, request.id);
        reply_header.set_packager(&PackagerName::from_configured("json"));
        let body = Packager::Json
            .encode(&Response::success(request.id, json!("hi")))
            .unwrap();
        let mut framed = frame::pack(&mut reply_header, &body).unwrap();
        framed.truncate(framed.len() - 3);
        Reply::Bytes(framed)
    })
    .await;
    let client = client_for(addr, base_options());

    let err = client.call::<Value>("Echo", params!["hi"]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Response);
}

#[tokio::test]
async fn test_trailing_bytes_after_body_are_ignored() {
    let (addr, _) = start_peer(Duration::ZERO, |header, request| {
        let mut reply_header = ProtocolHeader::new(header.magic_number, request.id);
        reply_header.set_packager(&PackagerName::from_configured("json"));
        let body = Packager::Json
            .encode(&Response::success(request.id, json!("hi")))
            .unwrap();
        let mut framed = frame::pack(&mut reply_header, &body).unwrap();
        framed.extend_from_slice(b"\n\n");
        Reply::Bytes(framed)
    })
    .await;
    let client = client_for(addr, base_options());

    let reply: String = client.call("Echo", params!["hi"]).await.unwrap();
    assert_eq!(reply, "hi");
}

#[tokio::test]
async fn test_slow_peer_is_network_timeout() {
    let (addr, _) = start_peer(Duration::from_secs(3), echo_service).await;
    let client = client_for(
        addr,
        base_options().with_timeout(Duration::from_millis(100)),
    );

    let err = client.call::<Value>("Echo", params!["hi"]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
    assert!(matches!(err, YarError::Network(TransportError::Timeout(_))));
}

#[tokio::test]
async fn test_unreachable_peer_is_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = client_for(addr, base_options());
    let err = client.call::<Value>("Echo", params!["hi"]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
}

// =========================================================================
// DNS cache
// =========================================================================

struct LoopbackResolver;

impl Resolver for LoopbackResolver {
    async fn lookup(&self, _host: &str) -> Result<Vec<IpAddr>, TransportError> {
        Ok(vec![IpAddr::V4(Ipv4Addr::LOCALHOST)])
    }
}

#[tokio::test]
async fn test_dns_cache_routes_through_resolver() {
    let (addr, seen) = start_peer(Duration::ZERO, echo_service).await;
    let transport = Arc::new(
        HttpTransport::with_resolver(HttpConfig::default(), LoopbackResolver).unwrap(),
    );
    let client = Client::with_transport(
        format!("http://svc.yar.test:{}/rpc", addr.port()),
        transport,
    )
    .unwrap()
    .with_options(base_options().with_dns_cache(true));

    let reply: String = client.call("Echo", params!["cached"]).await.unwrap();
    assert_eq!(reply, "cached");
    assert_eq!(seen.count(), 1);
}
