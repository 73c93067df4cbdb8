use actix_web::web;

pub mod auth;
pub mod automations;
pub mod health;
pub mod integrations;
pub mod notifications;
pub mod projects;
pub mod realtime;
pub mod reports;
pub mod sections;
pub mod tasks;

pub fn config(cfg: &mut web::ServiceConfig) {
    // Probes and the notification socket (public)
    cfg.service(health::health_check)
        .service(health::readiness)
        .service(health::liveness)
        .service(health::metrics)
        .service(health::info)
        .service(realtime::notifications_socket);

    // Auth routes (public, except /me)
    cfg.service(
        web::scope("/api/auth")
            .service(auth::signup)
            .service(auth::login)
            .service(auth::me),
    );

    // Projects and everything nested under a project (protected).
    // `/paginated` must be registered before `/{project_id}`.
    cfg.service(
        web::scope("/api/projects")
            .service(projects::list_projects)
            .service(projects::list_projects_paginated)
            .service(projects::create_project)
            .service(projects::get_project)
            .service(projects::update_project)
            .service(projects::delete_project)
            .service(projects::list_members)
            .service(projects::add_member)
            .service(projects::remove_member)
            .service(projects::project_metrics)
            .service(sections::list_sections)
            .service(sections::create_section)
            .service(tasks::list_tasks)
            .service(tasks::create_task)
            .service(reports::list_reports)
            .service(reports::create_report)
            .service(integrations::list_integrations)
            .service(integrations::add_integration),
    );

    cfg.service(
        web::scope("/api/sections")
            .service(sections::update_section)
            .service(sections::delete_section),
    );

    cfg.service(
        web::scope("/api/tasks")
            .service(tasks::get_task)
            .service(tasks::update_task)
            .service(tasks::delete_task)
            .service(tasks::move_task)
            .service(tasks::list_comments)
            .service(tasks::add_comment),
    );

    cfg.service(web::scope("/api/comments").service(tasks::delete_comment));

    // Fixed paths before `/{notification_id}/read`
    cfg.service(
        web::scope("/api/notifications")
            .service(notifications::list_notifications)
            .service(notifications::unread_count)
            .service(notifications::mark_all_read)
            .service(notifications::get_preferences)
            .service(notifications::update_preferences)
            .service(notifications::mark_read),
    );

    cfg.service(
        web::scope("/api/automations")
            .service(automations::list_automations)
            .service(automations::create_automation)
            .service(automations::get_automation)
            .service(automations::update_automation)
            .service(automations::delete_automation)
            .service(automations::toggle_automation)
            .service(automations::automation_logs),
    );

    cfg.service(
        web::scope("/api/reports")
            .service(reports::get_report)
            .service(reports::update_report)
            .service(reports::delete_report)
            .service(reports::generate_report),
    );

    cfg.service(web::scope("/api/integrations").service(integrations::delete_integration));

    // Third-party deliveries, authenticated by signature
    cfg.service(web::scope("/webhooks").service(integrations::receive_webhook));
}
