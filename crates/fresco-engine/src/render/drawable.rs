use crate::backend::Backend;
use crate::render::RenderCtx;

/// Something a window can draw into a viewport.
///
/// Implementors record into `frame` and must stay inside `ctx.viewport`.
/// They do not present; the window decides when the frame goes out.
///
/// `render` runs while its window and the platform are busy. Handle and
/// platform queries made from inside it report the state from just before
/// the call. Operations that need the window or the back-end fail with
/// [`Error::InvalidArgument`](crate::Error::InvalidArgument) or are ignored
/// with a warning.
pub trait Drawable<B: Backend> {
    fn render(&self, frame: &mut B::Frame, ctx: &RenderCtx<'_, B>);
}

impl<B, F> Drawable<B> for F
where
    B: Backend,
    F: Fn(&mut B::Frame, &RenderCtx<'_, B>),
{
    fn render(&self, frame: &mut B::Frame, ctx: &RenderCtx<'_, B>) {
        self(frame, ctx)
    }
}
