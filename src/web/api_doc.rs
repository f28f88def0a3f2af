use utoipa::OpenApi;

use super::api::error::ErrorResponse;
use super::api::groups::{CreateGroupRequest, CreateSwathRequest, CreatedResponse};

#[derive(OpenApi)]
#[openapi(
    paths(
        super::api::tracking::start,
        super::api::tracking::stop,
        super::api::tracking::status,
        super::api::groups::list_groups,
        super::api::groups::create_group,
        super::api::groups::get_group,
        super::api::groups::end_group,
        super::api::groups::delete_group,
        super::api::groups::sync_groups,
        super::api::groups::list_swaths,
        super::api::groups::create_swath,
        super::api::groups::delete_swath,
    ),
    components(
        schemas(
            ErrorResponse,
            CreateGroupRequest,
            CreateSwathRequest,
            CreatedResponse,
            crate::mission::MissionStatus,
            crate::mission::MissionSnapshot,
            crate::mission::PositionUpdate,
            crate::orbit::SatelliteState,
            crate::orbit::GeodeticPosition,
            crate::swath::SwathGeometry,
            crate::swath::SwathGroup,
            crate::swath::SwathInstance,
            crate::swath::SwathMode,
            crate::swath::VisualizationOptions,
            crate::swath::LonLat,
            crate::swath::SyncReport,
        )
    ),
    info(
        title = "Sar-O-Mat Mission API",
        description = "Tracking control and swath group management for the SAR mission simulator",
        version = "0.1.0"
    ),
    tags(
        (name = "tracking", description = "Realtime tracking lifecycle"),
        (name = "groups", description = "Swath groups"),
        (name = "swaths", description = "Swath instances")
    )
)]
pub struct ApiDoc;
