use crystaltides_core::{ErrorBody, FieldError, PaginationMeta};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::health::controller::health,
        crate::modules::forum::controller::get_threads,
        crate::modules::forum::controller::get_thread,
        crate::modules::forum::controller::get_posts,
        crate::modules::forum::controller::get_user_threads,
        crate::modules::forum::controller::create_thread,
        crate::modules::forum::controller::create_post,
        crate::modules::forum::controller::update_thread,
        crate::modules::forum::controller::delete_thread,
        crate::modules::forum::controller::update_post,
        crate::modules::forum::controller::delete_post,
        crate::modules::rules::controller::get_rules,
        crate::modules::rules::controller::create_rule,
        crate::modules::rules::controller::update_rule,
        crate::modules::rules::controller::delete_rule,
        crate::modules::policies::controller::get_policies,
        crate::modules::policies::controller::get_policy,
        crate::modules::policies::controller::upsert_policy,
        crate::modules::wiki::controller::get_articles,
        crate::modules::wiki::controller::get_article,
        crate::modules::wiki::controller::create_article,
        crate::modules::wiki::controller::update_article,
        crate::modules::wiki::controller::delete_article,
        crate::modules::polls::controller::get_polls,
        crate::modules::polls::controller::get_active_poll,
        crate::modules::polls::controller::get_poll,
        crate::modules::polls::controller::create_poll,
        crate::modules::polls::controller::vote,
        crate::modules::polls::controller::delete_poll,
        crate::modules::suggestions::controller::create_suggestion,
        crate::modules::suggestions::controller::get_suggestions,
        crate::modules::suggestions::controller::update_suggestion_status,
        crate::modules::suggestions::controller::delete_suggestion,
        crate::modules::tickets::controller::get_tickets,
        crate::modules::tickets::controller::get_ticket_stats,
        crate::modules::tickets::controller::create_ticket,
        crate::modules::tickets::controller::update_ticket_status,
        crate::modules::tickets::controller::get_ticket_messages,
        crate::modules::tickets::controller::add_ticket_message,
        crate::modules::tickets::controller::delete_ticket,
        crate::modules::donations::controller::get_donations,
        crate::modules::donations::controller::get_donation_stats,
        crate::modules::donations::controller::create_donation,
        crate::modules::donations::controller::update_donation,
        crate::modules::donations::controller::delete_donation,
        crate::modules::logs::controller::get_logs,
        crate::modules::logs::controller::create_log,
        crate::modules::logs::controller::get_command_logs,
        crate::modules::logs::controller::report_security_alert,
        crate::modules::webhooks::controller::kofi_webhook,
        crate::modules::webhooks::controller::minecraft_webhook,
        crate::modules::translation::controller::translate,
        crate::modules::users::controller::get_me,
        crate::modules::users::controller::update_my_profile,
        crate::modules::users::controller::get_users,
        crate::modules::users::controller::get_staff,
        crate::modules::users::controller::get_public_profile,
        crate::modules::users::controller::update_user_role,
        crate::modules::users::controller::update_user_metadata,
        crate::modules::two_factor::controller::get_status,
        crate::modules::two_factor::controller::setup,
        crate::modules::two_factor::controller::enable,
        crate::modules::two_factor::controller::disable,
        crate::modules::two_factor::controller::verify,
    ),
    components(schemas(ErrorBody, FieldError, PaginationMeta)),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness"),
        (name = "Forum", description = "Threads and posts"),
        (name = "Rules", description = "Server rules"),
        (name = "Policies", description = "Legal and community policies"),
        (name = "Wiki", description = "Wiki articles"),
        (name = "Polls", description = "Polls and votes"),
        (name = "Suggestions", description = "Player suggestions"),
        (name = "Tickets", description = "Support tickets"),
        (name = "Donations", description = "Ko-fi and manual donations"),
        (name = "Logs", description = "Audit and command logs"),
        (name = "Webhooks", description = "Inbound integrations"),
        (name = "Translation", description = "Machine translation"),
        (name = "Users", description = "Profiles and role management"),
        (name = "Two-Factor", description = "TOTP enrolment and admin step-up")
    ),
    info(
        title = "CrystalTides API",
        version = "0.1.0",
        description = "Website API of the CrystalTides game server: forum, wiki, polls, \
                       tickets, donations and staff tooling.",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_routes_and_bearer_scheme() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/forum/threads"));
        assert!(doc.paths.paths.contains_key("/api/users/{id}/role"));
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
