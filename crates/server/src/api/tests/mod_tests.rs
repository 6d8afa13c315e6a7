use super::*;

#[test]
fn not_found_maps_to_404() {
    let (status, Json(body)) = error_response(ApiError::not_found("intake form x not found"));
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body.code, ErrorCode::NotFound);
}

#[test]
fn validation_maps_to_400() {
    let (status, _) = error_response(ApiError::validation("bad"));
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[test]
fn internal_maps_to_500() {
    let (status, Json(body)) = error_response(ApiError::new(ErrorCode::Internal, "boom"));
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body.message, "boom");
}
