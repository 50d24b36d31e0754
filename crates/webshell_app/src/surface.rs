use std::path::Path;

use url::Url;

/// The embedded web view. Calls arrive on the owner thread only.
pub trait RenderingSurface {
    fn load(&mut self, url: &Url);
    fn go_back(&mut self);
    fn go_forward(&mut self);
    fn reload(&mut self);
    fn can_go_back(&self) -> bool;
    fn can_go_forward(&self) -> bool;
    fn current_url(&self) -> Option<Url>;
    /// Runs a script in the main frame; the result is discarded.
    fn evaluate_script(&mut self, script: &str);
}

/// Native UI around the rendering surface.
pub trait HostShell {
    /// Shows a local or remote document in the previewer.
    fn present_preview(&mut self, target: &Url);
    /// Offers a finished download to the user.
    fn present_export(&mut self, path: &Path);
    fn open_external(&mut self, url: &Url);
}
