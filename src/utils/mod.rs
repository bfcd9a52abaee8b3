pub mod app_error;
pub mod slug;
pub mod validated_query;
