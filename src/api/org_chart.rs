use poem::Request;
use poem_openapi::{OpenApi, Tags, param::Path, payload::Json};
use std::sync::Arc;

use crate::app_data::AppData;
use crate::coordinators::{AuthCoordinator, OrgChartCoordinator};
use crate::errors::AdminError;
use crate::types::db::{Role, unit, user};
use crate::types::dto::common::MessageResponse;
use crate::types::dto::org_chart::{
    AssignUserRequest, CreateUserRequest, OrgChartResponse, UnitCreatedResponse, UnitNode,
    UnitRequest, UnitResponse, UpdateUserRequest, UserCreatedResponse,
};
use crate::types::dto::user::{UnitSummary, UserProfile, UserResponse};
use crate::types::internal::context::RequestContext;

/// Organizational chart administration, admin role only
pub struct OrgChartApi {
    auth_coordinator: AuthCoordinator,
    org_chart_coordinator: OrgChartCoordinator,
    public_base: String,
    trust_proxy_headers: bool,
}

impl OrgChartApi {
    pub fn new(app_data: Arc<AppData>) -> Self {
        Self {
            auth_coordinator: AuthCoordinator::new(app_data.clone()),
            org_chart_coordinator: OrgChartCoordinator::new(app_data.clone()),
            public_base: app_data.settings.storage_public_url().to_string(),
            trust_proxy_headers: app_data.settings.trust_proxy_headers(),
        }
    }

    /// Authentication gate plus the admin role check
    async fn authorize(&self, req: &Request) -> Result<(), AdminError> {
        let ctx = RequestContext::from_request(req, self.trust_proxy_headers);
        let auth = self
            .auth_coordinator
            .authenticate(&ctx)
            .await
            .map_err(AdminError::from_internal_error)?;
        self.auth_coordinator
            .require_role(&auth, &[Role::Admin])
            .map_err(AdminError::from_internal_error)
    }

    async fn unit_node(&self, model: &unit::Model) -> Result<UnitNode, AdminError> {
        let mut node = UnitNode::bare(model);
        if let Some(parent_id) = model.parent_unit_id {
            let parent = self
                .org_chart_coordinator
                .find_unit(parent_id)
                .await
                .map_err(AdminError::from_internal_error)?;
            node.parent = Some(UnitSummary::from(&parent));
        }
        Ok(node)
    }

    async fn user_profile(&self, model: &user::Model) -> Result<UserProfile, AdminError> {
        let unit = match model.unit_id {
            Some(unit_id) => Some(
                self.org_chart_coordinator
                    .find_unit(unit_id)
                    .await
                    .map_err(AdminError::from_internal_error)?,
            ),
            None => None,
        };
        Ok(UserProfile::from_model(model, unit.as_ref(), &self.public_base))
    }
}

#[derive(Tags)]
enum OrgChartTags {
    /// Unit tree and user placement
    OrganizationalChart,
}

#[OpenApi(prefix_path = "/organizational-chart")]
impl OrgChartApi {
    /// Active unit forest with members and the unassigned pool
    #[oai(path = "/", method = "get", tag = "OrgChartTags::OrganizationalChart")]
    async fn index(&self, req: &Request) -> Result<Json<OrgChartResponse>, AdminError> {
        self.authorize(req).await?;
        let data = self
            .org_chart_coordinator
            .index()
            .await
            .map_err(AdminError::from_internal_error)?;
        Ok(Json(OrgChartResponse {
            success: true,
            message: "Organizational chart retrieved successfully.".to_string(),
            data,
        }))
    }

    #[oai(path = "/units", method = "post", tag = "OrgChartTags::OrganizationalChart")]
    async fn create_unit(&self, req: &Request, body: Json<UnitRequest>) -> Result<UnitCreatedResponse, AdminError> {
        self.authorize(req).await?;
        let unit = self
            .org_chart_coordinator
            .create_unit(body.0)
            .await
            .map_err(AdminError::from_internal_error)?;
        Ok(UnitCreatedResponse::Created(Json(UnitResponse::ok(
            "Unit created successfully.",
            self.unit_node(&unit).await?,
        ))))
    }

    /// Edit a unit; a role change is applied to all of its members
    #[oai(path = "/units/:id", method = "put", tag = "OrgChartTags::OrganizationalChart")]
    async fn update_unit(
        &self,
        req: &Request,
        id: Path<i32>,
        body: Json<UnitRequest>,
    ) -> Result<Json<UnitResponse>, AdminError> {
        self.authorize(req).await?;
        let unit = self
            .org_chart_coordinator
            .update_unit(id.0, body.0)
            .await
            .map_err(AdminError::from_internal_error)?;
        Ok(Json(UnitResponse::ok(
            "Unit updated successfully.",
            self.unit_node(&unit).await?,
        )))
    }

    /// Delete a unit without children; its members become unassigned
    #[oai(path = "/units/:id", method = "delete", tag = "OrgChartTags::OrganizationalChart")]
    async fn delete_unit(&self, req: &Request, id: Path<i32>) -> Result<Json<MessageResponse>, AdminError> {
        self.authorize(req).await?;
        self.org_chart_coordinator
            .delete_unit(id.0)
            .await
            .map_err(AdminError::from_internal_error)?;
        Ok(Json(MessageResponse::ok("Unit deleted successfully.")))
    }

    #[oai(path = "/users", method = "post", tag = "OrgChartTags::OrganizationalChart")]
    async fn create_user(
        &self,
        req: &Request,
        body: Json<CreateUserRequest>,
    ) -> Result<UserCreatedResponse, AdminError> {
        self.authorize(req).await?;
        let user = self
            .org_chart_coordinator
            .create_user(body.0)
            .await
            .map_err(AdminError::from_internal_error)?;
        Ok(UserCreatedResponse::Created(Json(UserResponse::ok(
            "User created successfully.",
            self.user_profile(&user).await?,
        ))))
    }

    #[oai(path = "/users/:id", method = "put", tag = "OrgChartTags::OrganizationalChart")]
    async fn update_user(
        &self,
        req: &Request,
        id: Path<String>,
        body: Json<UpdateUserRequest>,
    ) -> Result<Json<UserResponse>, AdminError> {
        self.authorize(req).await?;
        let user = self
            .org_chart_coordinator
            .update_user(&id.0, body.0)
            .await
            .map_err(AdminError::from_internal_error)?;
        Ok(Json(UserResponse::ok(
            "User updated successfully.",
            self.user_profile(&user).await?,
        )))
    }

    /// Place a user in a unit (`unit_id`) or unassign them (`null`)
    #[oai(path = "/users/:id/assign", method = "put", tag = "OrgChartTags::OrganizationalChart")]
    async fn assign_user(
        &self,
        req: &Request,
        id: Path<String>,
        body: Json<AssignUserRequest>,
    ) -> Result<Json<UserResponse>, AdminError> {
        self.authorize(req).await?;
        let user = self
            .org_chart_coordinator
            .assign_user(&id.0, body.0)
            .await
            .map_err(AdminError::from_internal_error)?;
        let message = if user.unit_id.is_some() {
            "User assigned successfully."
        } else {
            "User unassigned successfully."
        };
        Ok(Json(UserResponse::ok(message, self.user_profile(&user).await?)))
    }

    #[oai(path = "/users/:id", method = "delete", tag = "OrgChartTags::OrganizationalChart")]
    async fn delete_user(&self, req: &Request, id: Path<String>) -> Result<Json<MessageResponse>, AdminError> {
        self.authorize(req).await?;
        self.org_chart_coordinator
            .delete_user(&id.0)
            .await
            .map_err(AdminError::from_internal_error)?;
        Ok(Json(MessageResponse::ok("User deleted successfully.")))
    }
}
