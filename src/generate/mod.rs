mod dispatcher;

pub use dispatcher::render_dispatcher;
