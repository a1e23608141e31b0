//! TLS transport: identical state machine to `TransportTcp`, wrapping a `tokio_rustls` stream
//! instead of a bare `TcpStream`. Feature-gated behind `rust-tls`, matching the teacher.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::io::{split, AsyncReadExt, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_rustls::client::TlsStream;
use tokio_rustls::TlsConnector;
use tracing::{debug, warn};

use cassandra_protocol::compression::Compression;
use cassandra_protocol::frame::decoder::FrameDecoder;
use cassandra_protocol::frame::events::SimpleServerEvent;
use cassandra_protocol::frame::frame_event::ServerEvent;
use cassandra_protocol::frame::frame_startup::StartupOptions;
use cassandra_protocol::frame::{Frame, Opcode, Version};

use crate::authenticators::SaslAuthenticatorProvider;
use crate::error;
use crate::transport::stream_id_manager::StreamIdManager;
use crate::transport::CdrsTransport;

type PendingMap = Arc<Mutex<HashMap<i16, oneshot::Sender<error::Result<Frame>>>>>;

pub struct TransportRustls {
    addr: SocketAddr,
    write_half: tokio::sync::Mutex<WriteHalf<TlsStream<TcpStream>>>,
    stream_ids: StreamIdManager,
    pending: PendingMap,
    compression: Compression,
    version: Version,
    keyspace: Mutex<Option<String>>,
    broken: Arc<AtomicBool>,
    reader_task: JoinHandle<()>,
}

impl std::fmt::Debug for TransportRustls {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportRustls")
            .field("addr", &self.addr)
            .field("in_flight", &self.stream_ids.in_use())
            .finish()
    }
}

impl TransportRustls {
    #[allow(clippy::too_many_arguments)]
    pub async fn new(
        addr: SocketAddr,
        dns_name: rustls_pki_types::ServerName<'static>,
        connector: TlsConnector,
        version: Version,
        compression: Compression,
        tcp_nodelay: bool,
        keyspace: Option<String>,
        authenticator: Option<Arc<dyn SaslAuthenticatorProvider>>,
        event_types: Vec<SimpleServerEvent>,
        event_sender: Option<mpsc::Sender<ServerEvent>>,
    ) -> error::Result<Self> {
        let stream = TcpStream::connect(addr).await.map_err(error::Error::Io)?;
        stream.set_nodelay(tcp_nodelay).map_err(error::Error::Io)?;

        let tls_stream = connector
            .connect(dns_name, stream)
            .await
            .map_err(|err| error::Error::SslHandshake(err.to_string()))?;

        let (read_half, write_half) = split(tls_stream);

        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let broken = Arc::new(AtomicBool::new(false));
        let max_streams = if version >= Version::V3 { 32_768 } else { 128 };

        let reader_task = spawn_reader(
            read_half,
            pending.clone(),
            compression,
            broken.clone(),
            event_sender,
        );

        let transport = TransportRustls {
            addr,
            write_half: tokio::sync::Mutex::new(write_half),
            stream_ids: StreamIdManager::new(max_streams),
            pending,
            compression,
            version,
            keyspace: Mutex::new(None),
            broken,
            reader_task,
        };

        transport
            .run_startup(keyspace, authenticator, event_types)
            .await?;
        Ok(transport)
    }

    async fn run_startup(
        &self,
        keyspace: Option<String>,
        authenticator: Option<Arc<dyn SaslAuthenticatorProvider>>,
        event_types: Vec<SimpleServerEvent>,
    ) -> error::Result<()> {
        let _ = self.send(Frame::new_req_options(self.version)).await?;

        let compression_name = match self.compression {
            Compression::None => None,
            Compression::Snappy => Some("snappy".to_string()),
            Compression::Lz4 => Some("lz4".to_string()),
        };

        let startup_frame = Frame::new_req_startup_with_options(
            StartupOptions::new(compression_name),
            self.version,
        );
        let response = self.send(startup_frame).await?;
        self.handle_startup_response(response, authenticator).await?;

        if !event_types.is_empty() {
            let register_frame = Frame::new_req_register(self.version, event_types);
            let response = self.send(register_frame).await?;
            match response.body()? {
                cassandra_protocol::frame::frame_response::ResponseBody::Ready(_) => {}
                _ => return Err(error::Error::InvalidOpcode),
            }
        }

        if let Some(keyspace) = keyspace {
            let use_query = format!("USE \"{}\"", keyspace.replace('"', "\"\""));
            let flags = cassandra_protocol::query::utils::prepare_flags(false, false);
            let query = cassandra_protocol::query::Query {
                query: use_query,
                params: Default::default(),
            };
            let query_frame = Frame::new_query(self.version, query, flags);
            let response = self.send(query_frame).await?;
            if response.body()?.into_error().is_some() {
                return Err(error::Error::UnableToSetKeyspace(keyspace));
            }
            *self.keyspace.lock().unwrap() = Some(keyspace);
        }

        Ok(())
    }

    async fn handle_startup_response(
        &self,
        response: Frame,
        authenticator: Option<Arc<dyn SaslAuthenticatorProvider>>,
    ) -> error::Result<()> {
        use cassandra_protocol::frame::frame_response::ResponseBody;

        match response.body()? {
            ResponseBody::Ready(_) => Ok(()),
            ResponseBody::Authenticate(_) => {
                let provider = authenticator.ok_or(error::Error::Auth)?;
                let mut authenticator = provider.make_authenticator();
                let mut frame =
                    Frame::new_req_auth_response(self.version, authenticator.initial_response());

                loop {
                    let response = self.send(frame.clone()).await?;
                    match response.body()? {
                        ResponseBody::AuthChallenge(challenge) => {
                            let next = authenticator
                                .evaluate_challenge(challenge.data.unwrap_or_default())?;
                            frame = Frame::new_req_auth_response(self.version, next);
                        }
                        ResponseBody::AuthSuccess(success) => {
                            authenticator.success(success.data.unwrap_or_default())?;
                            return Ok(());
                        }
                        ResponseBody::Error(body) if body.is_bad_credentials() => {
                            return Err(error::Error::Auth)
                        }
                        _ => return Err(error::Error::InvalidOpcode),
                    }
                }
            }
            ResponseBody::Error(body) if body.is_unsupported_protocol_version() => {
                Err(error::Error::InvalidProtocol)
            }
            ResponseBody::Error(body) if body.is_bad_credentials() => Err(error::Error::Auth),
            _ => Err(error::Error::InvalidOpcode),
        }
    }

    async fn send(&self, frame: Frame) -> error::Result<Frame> {
        if self.broken.load(Ordering::Acquire) {
            return Err(error::Error::Close);
        }

        let stream_id = self.stream_ids.acquire()?;
        let (tx, rx) = oneshot::channel();
        self.pending.lock().unwrap().insert(stream_id, tx);

        let bytes = frame.encode_with_stream_id(stream_id, self.compression);

        let write_result = {
            let mut write_half = self.write_half.lock().await;
            write_half.write_all(&bytes).await
        };

        if let Err(err) = write_result {
            self.pending.lock().unwrap().remove(&stream_id);
            self.stream_ids.release(stream_id);
            self.broken.store(true, Ordering::Release);
            return Err(error::Error::Io(err));
        }

        let result = rx.await.unwrap_or(Err(error::Error::Close));
        self.stream_ids.release(stream_id);
        result
    }
}

impl Drop for TransportRustls {
    fn drop(&mut self) {
        self.reader_task.abort();
    }
}

impl CdrsTransport for TransportRustls {
    async fn write_frame(&self, frame: &Frame) -> error::Result<Frame> {
        self.send(frame.clone()).await
    }

    fn is_broken(&self) -> bool {
        self.broken.load(Ordering::Acquire)
    }

    fn address(&self) -> SocketAddr {
        self.addr
    }

    fn keyspace(&self) -> Option<String> {
        self.keyspace.lock().unwrap().clone()
    }

    fn set_keyspace(&self, keyspace: Option<String>) {
        *self.keyspace.lock().unwrap() = keyspace;
    }

    fn in_flight(&self) -> usize {
        self.stream_ids.in_use()
    }
}

fn spawn_reader(
    mut read_half: ReadHalf<TlsStream<TcpStream>>,
    pending: PendingMap,
    compression: Compression,
    broken: Arc<AtomicBool>,
    event_sender: Option<mpsc::Sender<ServerEvent>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut decoder = FrameDecoder::new(compression);
        let mut buf = [0u8; 8192];

        loop {
            let n = match read_half.read(&mut buf).await {
                Ok(0) => {
                    debug!("connection closed by peer");
                    break;
                }
                Ok(n) => n,
                Err(err) => {
                    warn!(error = %err, "socket read error");
                    break;
                }
            };

            match decoder.feed(&buf[..n]) {
                Ok(frames) => {
                    for frame in frames {
                        if frame.opcode == Opcode::Event {
                            if let Some(sender) = &event_sender {
                                if let Ok(Some(event)) =
                                    frame.body().map(|body| body.as_event().cloned())
                                {
                                    let _ = sender.try_send(event);
                                }
                            }
                            continue;
                        }

                        if let Some(sender) = pending.lock().unwrap().remove(&frame.stream_id) {
                            let _ = sender.send(Ok(frame));
                        }
                    }
                }
                Err(err) => {
                    warn!(error = %err, "frame decode error, closing connection");
                    break;
                }
            }
        }

        broken.store(true, Ordering::Release);
        for (_, sender) in pending.lock().unwrap().drain() {
            let _ = sender.send(Err(error::Error::Close));
        }
    })
}
