use ::std::{future::pending, net::SocketAddr, pin::Pin};

use ::axum_test::TestServer;
use ::tokio::{net::TcpListener, sync::mpsc};
use ::tokio_stream::{iter, wrappers::ReceiverStream, Stream};
use ::tonic::{
    transport::{server::TcpIncoming, Server},
    Request, Response, Status, Streaming,
};
use ::usergate_common::{
    anyhow::{anyhow, Result},
    user_grpc::{
        user_service_server::{UserService, UserServiceServer},
        FetchAll, Message, MessageResponse, StatusReply, UserCreate, UserDetails,
    },
};
use ::usergate_gateway::{connect_backend, get_gateway};

/// Backend that fails every call, some of them after a first successful message.
pub struct FailingUserService;

#[tonic::async_trait]
impl UserService for FailingUserService {
    async fn user_signup(
        &self,
        _request: Request<UserCreate>,
    ) -> Result<Response<StatusReply>, Status> {
        Err(Status::unavailable("backend is down"))
    }

    type ListUsersStream =
        Pin<Box<dyn Stream<Item = Result<UserDetails, Status>> + Send + 'static>>;

    async fn list_users(
        &self,
        _request: Request<FetchAll>,
    ) -> Result<Response<Self::ListUsersStream>, Status> {
        let first = UserDetails {
            id: 1,
            username: "Nikhil Kilivayil".to_owned(),
            email: "Nikhil@Brototype".to_owned(),
        };
        let users = iter(vec![Ok(first), Err(Status::internal("lost users"))]);
        Ok(Response::new(Box::pin(users)))
    }

    async fn upload_users(
        &self,
        _request: Request<Streaming<UserCreate>>,
    ) -> Result<Response<StatusReply>, Status> {
        Err(Status::unavailable("backend is down"))
    }

    type ChatStream = ReceiverStream<Result<MessageResponse, Status>>;

    /// Wait for the client to finish sending, then answer once and abort.
    async fn chat(
        &self,
        request: Request<Streaming<Message>>,
    ) -> Result<Response<Self::ChatStream>, Status> {
        let mut inbound = request.into_inner();
        let (tx, rx) = mpsc::channel(2);
        tokio::spawn(async move {
            let mut received = 0;
            while let Ok(Some(_)) = inbound.message().await {
                received += 1;
            }
            let reply = MessageResponse {
                reply: format!("received {}", received),
            };
            if tx.send(Ok(reply)).await.is_ok() {
                let _ = tx.send(Err(Status::aborted("chat closed"))).await;
            }
        });
        Ok(Response::new(ReceiverStream::new(rx)))
    }
}

pub async fn start_backend() -> Result<SocketAddr> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(usergate_backend::serve(listener, pending()));
    Ok(addr)
}

pub async fn start_failing_backend() -> Result<SocketAddr> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let incoming = TcpIncoming::from_listener(listener, false, None).map_err(|err| anyhow!(err))?;
    tokio::spawn(
        Server::builder()
            .add_service(UserServiceServer::new(FailingUserService))
            .serve_with_incoming(incoming),
    );
    Ok(addr)
}

pub fn get_test_server(backend: SocketAddr) -> Result<TestServer> {
    let client = connect_backend(&format!("http://{}", backend))?;
    TestServer::new(get_gateway(client))
}
