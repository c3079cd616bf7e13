use crate::models::{
    Application, ApplicationStatus, ApplicationWithWalker, ChatMessage, Dog, DogSize,
    MessageWithSender, NewDog, NewWalkRequest, Profile, RequestWithDog, Role, WalkRequest,
    WalkStatus,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::register,
        crate::routes::login,
        crate::routes::auth_me,
        crate::routes::update_profile,
        crate::routes::get_profile,
        crate::routes::create_dog,
        crate::routes::list_dogs,
        crate::routes::create_request,
        crate::routes::list_requests,
        crate::routes::get_request,
        crate::routes::apply,
        crate::routes::list_applications,
        crate::routes::accept,
        crate::routes::complete,
        crate::routes::list_messages,
        crate::routes::send_message,
        crate::routes::stream_messages,
        crate::routes::upload_photo,
    ),
    components(schemas(
        Role, DogSize, WalkStatus, ApplicationStatus,
        Profile, Dog, NewDog, WalkRequest, NewWalkRequest, RequestWithDog,
        Application, ApplicationWithWalker, ChatMessage, MessageWithSender,
        crate::routes::RegisterRequest, crate::routes::LoginRequest,
        crate::routes::SessionResponse, crate::routes::UpdateProfileRequest,
        crate::routes::AcceptRequest, crate::routes::AcceptResponse,
        crate::routes::SendMessageRequest, crate::routes::PhotoUploadResponse
    )),
    tags(
        (name = "auth", description = "Registration and sessions"),
        (name = "dogs", description = "Dog registry"),
        (name = "requests", description = "Walk request lifecycle"),
        (name = "chat", description = "Per-walk chat channel"),
    )
)]
pub struct ApiDoc;
