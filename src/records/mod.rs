pub mod handlers;
pub mod service;

use axum::{
    routing::{get, post},
    Extension, Router,
};

use crate::entity::EntitySchema;
use crate::state::AppState;

pub static AWARDS: EntitySchema = EntitySchema {
    name: "awards",
    required: &["awardee_id", "title"],
    optional: &["description"],
    // Historical naming; every other owned entity uses user_id.
    owner_field: "awardee_id",
};

pub static CERTIFICATES: EntitySchema = EntitySchema {
    name: "certificates",
    required: &["user_id", "title"],
    optional: &["description", "when_date"],
    owner_field: "user_id",
};

pub static CAREERS: EntitySchema = EntitySchema {
    name: "careers",
    required: &["user_id", "title"],
    optional: &["description", "from_date", "to_date"],
    owner_field: "user_id",
};

pub static TECHSTACKS: EntitySchema = EntitySchema {
    name: "techstacks",
    required: &["user_id", "title"],
    optional: &["description", "level"],
    owner_field: "user_id",
};

pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/awards", entity_routes(&AWARDS))
        .nest("/certificates", entity_routes(&CERTIFICATES))
        .nest("/careers", entity_routes(&CAREERS))
        .nest("/techstacks", entity_routes(&TECHSTACKS))
}

fn entity_routes(schema: &'static EntitySchema) -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::add_record).get(handlers::list_records))
        .route(
            "/:id",
            get(handlers::get_record)
                .put(handlers::set_record)
                .delete(handlers::del_record),
        )
        .route("/user/:user_id", get(handlers::list_user_records))
        .layer(Extension(schema))
}
