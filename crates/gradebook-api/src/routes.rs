use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State, WebSocketUpgrade},
    response::IntoResponse,
    routing::{get, post, put},
};
use tower_http::services::ServeDir;

use gradebook_gateway::connection;
use gradebook_types::api::Ack;

use crate::auth::{self, AppState};
use crate::{
    assignments, chatrooms, grades, groups, notifications, private_messages, profile, remarks,
    students, targets,
};

/// Every HTTP route, the WebSocket gateway and the upload directory.
///
/// REST routes are served both at the root and under `/api`.
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    let api = Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/profile/{id}", get(profile::get_profile).put(profile::update_profile))
        .route("/profile/{id}/photo", post(profile::upload_photo))
        .route("/students", get(students::list_students).post(students::create_student))
        .route(
            "/students/{id}",
            get(students::get_student)
                .put(students::rename_student)
                .delete(students::delete_student),
        )
        .route("/students/{id}/trends", get(students::student_trends))
        .route("/grades", get(grades::list_grades).post(grades::add_grade))
        .route(
            "/assignments",
            get(assignments::list_assignments).post(assignments::submit_assignment),
        )
        .route("/assignments/{id}/status", put(assignments::update_status))
        .route("/remarks", post(remarks::add_remark))
        .route("/chatrooms", get(chatrooms::list_chatrooms).post(chatrooms::create_chatroom))
        .route("/chatrooms/{id}/invite", post(chatrooms::invite))
        .route("/chatrooms/{id}/remove", post(chatrooms::remove_member))
        .route(
            "/chatrooms/{id}/messages",
            get(chatrooms::list_messages).post(chatrooms::send_message),
        )
        .route("/groups", get(groups::list_groups).post(groups::create_group))
        .route("/groups/{id}", get(groups::get_group).delete(groups::delete_group))
        .route(
            "/groups/{id}/members",
            post(groups::add_member).delete(groups::remove_member),
        )
        .route("/targets", post(targets::set_target))
        .route(
            "/notifications/{user_id}",
            get(notifications::list_notifications).put(notifications::mark_read),
        )
        .route(
            "/private_messages/{user_id}",
            get(private_messages::list_private_messages)
                .post(private_messages::send_private_message),
        )
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state.clone());

    let gateway = Router::new()
        .route("/gateway", get(ws_upgrade))
        .with_state(state.clone());

    Router::new()
        .merge(api.clone())
        .nest("/api", api)
        .merge(gateway)
        .route("/health", get(health))
        .nest_service("/uploads", ServeDir::new(state.uploads.dir()))
}

async fn health() -> Json<Ack> {
    Json(Ack::new("OK"))
}

async fn ws_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    let dispatcher = state.dispatcher.clone();
    let jwt_secret = state.jwt_secret.clone();
    ws.on_upgrade(move |socket| connection::handle_connection(socket, dispatcher, jwt_secret))
}
