pub mod supabase;

pub use supabase::{filter_value, is_conflict, DataApiError, SupabaseClient};
