mod gallery_flow;
mod index_loading;
mod location_history;
