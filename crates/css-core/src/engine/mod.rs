//! Frontera con el motor de transformación.
//!
//! El motor es opaco: recibe la cadena de plugins, el texto y las opciones ya
//! fusionadas, y devuelve `{css, map, warnings}` o un error (posiblemente de
//! sintaxis). El core no inspecciona ni altera el comportamiento de plugins.
use async_trait::async_trait;
use log::debug;

use crate::errors::EngineError;
use crate::model::{EngineOutput, ProcessOptions};

#[async_trait]
pub trait Engine: Send + Sync {
    /// Tipo de plugin que entiende este motor.
    type Plugin: Send + Sync;

    async fn process(
        &self,
        plugins: &[Self::Plugin],
        css: &str,
        options: &ProcessOptions,
    ) -> Result<EngineOutput, EngineError>;
}

/// Construye la llamada al motor y propaga su resultado sin tocarlo.
pub async fn invoke<E>(engine: &E, plugins: &[E::Plugin], options: &ProcessOptions, text: &str) -> Result<EngineOutput, EngineError>
    where E: Engine + ?Sized
{
    debug!("engine:start plugins={} bytes={}", plugins.len(), text.len());
    let output = engine.process(plugins, text, options).await?;
    debug!("engine:done bytes={} warnings={} map={}", output.css.len(), output.warnings.len(), output.map.is_some());
    Ok(output)
}
