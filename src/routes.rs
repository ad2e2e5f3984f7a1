use crate::{
    api::{attendance, branch, notification, report, student},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_web::{middleware::from_fn, web};

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(web::resource("/login").route(web::post().to(handlers::login)))
            .service(web::resource("/register").route(web::post().to(handlers::register)))
            .service(web::resource("/refresh").route(web::post().to(handlers::refresh_token)))
            .service(web::resource("/logout").route(web::post().to(handlers::logout))),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            .service(
                web::scope("/students")
                    // /students
                    .service(
                        web::resource("")
                            .route(web::post().to(student::create_student))
                            .route(web::get().to(student::list_students)),
                    )
                    // bulk roster exchange; registered before /{id}
                    .service(
                        web::resource("/import").route(web::post().to(student::import_students)),
                    )
                    .service(
                        web::resource("/export").route(web::get().to(student::export_students)),
                    )
                    // /students/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(student::get_student))
                            .route(web::put().to(student::update_student)),
                    )
                    // /students/{id}/notification
                    .service(
                        web::resource("/{id}/notification")
                            .route(web::get().to(notification::get_notification_settings))
                            .route(web::put().to(notification::upsert_notification_settings)),
                    ),
            )
            .service(
                web::scope("/branches").service(
                    web::resource("")
                        .route(web::get().to(branch::list_branches))
                        .route(web::post().to(branch::create_branch)),
                ),
            )
            .service(
                web::scope("/attendance").service(
                    web::resource("")
                        .route(web::get().to(attendance::list_attendance))
                        .route(web::post().to(attendance::record_attendance))
                        .route(web::put().to(attendance::mark_attendance)),
                ),
            )
            .service(
                web::scope("/notifications").service(
                    web::resource("/dispatch")
                        .route(web::post().to(notification::dispatch_notification)),
                ),
            )
            .service(
                web::scope("/reports")
                    .service(web::resource("/statistics").route(web::get().to(report::statistics)))
                    .service(web::resource("/by-date").route(web::get().to(report::by_date))),
            ),
    );
}
