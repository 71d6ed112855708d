/// A push button that can be awaited.
pub trait Button {
    type Error;

    /// Resolves on the edge into the pressed state.
    async fn wait_pressed(&mut self) -> Result<(), Self::Error>;

    /// Resolves on the edge into the released state.
    async fn wait_released(&mut self) -> Result<(), Self::Error>;
}
