//! gRPC implementation of the user service.
//!
//! The service keeps no state: users are fixed and chat messages are echoed.

use ::std::pin::Pin;

use ::tokio::sync::mpsc;
use ::tokio_stream::{wrappers::ReceiverStream, Stream, StreamExt};
use ::tonic::{Request, Response, Status, Streaming};
use ::tracing::{error, info};
use ::usergate_common::user_grpc::{
    user_service_server::UserService, FetchAll, Message, MessageResponse, StatusReply,
    UserCreate, UserDetails,
};

/// Outbound messages buffered per chat call before the worker waits for the client.
const CHAT_BUFFER_SIZE: usize = 16;

type ListUsersStream = Pin<Box<dyn Stream<Item = Result<UserDetails, Status>> + Send + 'static>>;

#[derive(Debug, Default)]
pub struct UserServiceImpl;

/// Users returned by `ListUsers`, in this order.
pub(crate) fn registered_users() -> Vec<UserDetails> {
    vec![
        UserDetails {
            id: 1,
            username: "Nikhil Kilivayil".to_owned(),
            email: "Nikhil@Brototype".to_owned(),
        },
        UserDetails {
            id: 2,
            username: "Faisal".to_owned(),
            email: "Faisal@Brototype".to_owned(),
        },
    ]
}

fn success(message: &str) -> StatusReply {
    StatusReply {
        status: "success".to_owned(),
        message: message.to_owned(),
    }
}

/// Drain the uploaded users, failing with the first receive error.
async fn receive_users<S>(mut users: S) -> Result<StatusReply, Status>
where
    S: Stream<Item = Result<UserCreate, Status>> + Unpin,
{
    while let Some(user) = users.next().await.transpose()? {
        info!("Received user: {}", user.username);
    }
    Ok(success("Users uploaded successfully"))
}

/// Answer every message of the chat with its echo, until the client closes its side.
/// A receive error is forwarded as the last item of `outbound`.
async fn echo_messages<S>(
    mut inbound: S,
    outbound: mpsc::Sender<Result<MessageResponse, Status>>,
) where
    S: Stream<Item = Result<Message, Status>> + Unpin,
{
    loop {
        let reply = match inbound.next().await.transpose() {
            Ok(Some(Message { content })) => {
                info!("Received message: {}", content);
                Ok(MessageResponse {
                    reply: format!("Echo: {}", content),
                })
            }
            Ok(None) => {
                info!("End of stream");
                return;
            }
            Err(status) => {
                error!("Error receiving message: {}", status);
                Err(status)
            }
        };
        let terminal = reply.is_err();
        if let Err(err) = outbound.send(reply).await {
            error!("Error sending message: {}", err);
            return;
        }
        if terminal {
            return;
        }
    }
}

#[tonic::async_trait]
impl UserService for UserServiceImpl {
    async fn user_signup(
        &self,
        request: Request<UserCreate>,
    ) -> Result<Response<StatusReply>, Status> {
        info!("Sign up user: {}", request.get_ref().username);
        Ok(Response::new(success("User signed successfully")))
    }

    type ListUsersStream = ListUsersStream;

    async fn list_users(
        &self,
        _request: Request<FetchAll>,
    ) -> Result<Response<Self::ListUsersStream>, Status> {
        let users = ::tokio_stream::iter(registered_users().into_iter().map(Ok));
        Ok(Response::new(Box::pin(users)))
    }

    async fn upload_users(
        &self,
        request: Request<Streaming<UserCreate>>,
    ) -> Result<Response<StatusReply>, Status> {
        receive_users(request.into_inner()).await.map(Response::new)
    }

    type ChatStream = ReceiverStream<Result<MessageResponse, Status>>;

    async fn chat(
        &self,
        request: Request<Streaming<Message>>,
    ) -> Result<Response<Self::ChatStream>, Status> {
        let (tx, rx) = mpsc::channel(CHAT_BUFFER_SIZE);
        tokio::spawn(echo_messages(request.into_inner(), tx));
        Ok(Response::new(ReceiverStream::new(rx)))
    }
}
