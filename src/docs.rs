// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;
use crate::services;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Settings ---
        handlers::settings::get_kwh_price,
        handlers::settings::update_kwh_price,
        handlers::settings::get_kwh_price_history,

        // --- Commissions ---
        handlers::commissions::calculate,
        handlers::commissions::create_for_consumer,
        handlers::commissions::mark_as_paid,
        handlers::commissions::list_all,
        handlers::commissions::list_pending,
        handlers::commissions::list_for_representative,
        handlers::commissions::get_stats,
        handlers::commissions::list_by_period,

        // --- Generators ---
        handlers::generators::list_generators,
        handlers::generators::create_generator,
        handlers::generators::get_generator,
        handlers::generators::update_generator,
        handlers::generators::delete_generator,
        handlers::generators::get_capacity,

        // --- Consumers ---
        handlers::consumers::list_consumers,
        handlers::consumers::create_consumer,
        handlers::consumers::submit_consumer,
        handlers::consumers::get_consumer,
        handlers::consumers::allocate_consumer,
        handlers::consumers::deallocate_consumer,

        // --- Approvals ---
        handlers::approvals::list_pending_consumers,
        handlers::approvals::approve_consumer,
        handlers::approvals::reject_consumer,

        // --- Change Requests ---
        handlers::change_requests::create_change_request,
        handlers::change_requests::list_pending_change_requests,
        handlers::change_requests::list_my_change_requests,
        handlers::change_requests::approve_change_request,
        handlers::change_requests::reject_change_request,

        // --- Representatives ---
        handlers::representatives::list_representatives,
        handlers::representatives::create_representative,
        handlers::representatives::get_representative,
        handlers::representatives::update_representative_status,
    ),
    components(
        schemas(
            // --- Settings ---
            models::settings::SystemSetting,
            handlers::settings::KwhPriceResponse,
            handlers::settings::UpdateKwhPricePayload,

            // --- Commissions ---
            models::commission::CommissionStatus,
            models::commission::Commission,
            models::commission::CommissionQuote,
            models::commission::CommissionStats,
            models::commission::StatusBucket,
            models::commission::MonthlyBucket,
            handlers::commissions::CalculateCommissionPayload,

            // --- Generators ---
            models::generator::SourceType,
            models::generator::GeneratorStatus,
            models::generator::Generator,
            models::generator::CapacityView,
            models::generator::GeneratorWithCapacity,
            models::generator::GeneratorDetail,
            handlers::generators::CreateGeneratorPayload,
            handlers::generators::UpdateGeneratorPayload,

            // --- Consumers ---
            models::consumer::ConsumerType,
            models::consumer::ConsumerPhase,
            models::consumer::ConsumerStatus,
            models::consumer::ApprovalStatus,
            models::consumer::Consumer,
            handlers::consumers::ConsumerPayload,
            handlers::consumers::AllocatePayload,

            // --- Approvals ---
            services::approval_service::ApprovalOutcome,
            handlers::approvals::RejectPayload,

            // --- Change Requests ---
            models::change_request::ChangeRequestStatus,
            models::change_request::ConsumerChangeRequest,
            models::change_request::ConsumerChanges,
            models::change_request::ChangeRequestReview,
            handlers::change_requests::CreateChangeRequestPayload,

            // --- Representatives ---
            models::representative::RepresentativeStatus,
            models::representative::Representative,
            handlers::representatives::CreateRepresentativePayload,
            handlers::representatives::UpdateRepresentativeStatusPayload,

            // --- Paginação ---
            crate::common::pagination::Pagination,
        )
    ),
    tags(
        (name = "Settings", description = "Preço do kWh e histórico"),
        (name = "Commissions", description = "Cálculo, criação e pagamento de comissões"),
        (name = "Generators", description = "Usinas geradoras e capacidade"),
        (name = "Consumers", description = "Cadastro e alocação de consumidores"),
        (name = "Approvals", description = "Aprovação de consumidores submetidos"),
        (name = "Change Requests", description = "Alterações pedidas por representantes"),
        (name = "Representatives", description = "Gestão de representantes")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_the_main_routes_and_the_bearer_scheme() {
        let doc = ApiDoc::openapi();

        assert!(doc.paths.paths.contains_key("/api/commissions/calculate"));
        assert!(doc.paths.paths.contains_key("/api/generators/{id}/capacity"));
        assert!(doc.paths.paths.contains_key("/api/change-requests/{id}/approve"));

        let components = doc.components.expect("componentes");
        assert!(components.security_schemes.contains_key("api_jwt"));
    }
}
