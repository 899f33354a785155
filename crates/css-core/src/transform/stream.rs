//! Driver mínimo del stream: bombea registros desde un canal, los pasa por el
//! transform y reenvía exactamente una finalización por registro.
//!
//! Con `concurrency = 1` (por defecto) los archivos se procesan en serie y la
//! salida conserva el orden de entrada. Con valores mayores puede haber varios
//! archivos en vuelo y la salida puede reordenarse.

use std::sync::Arc;

use log::{debug, error, info};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;

use super::{Completion, CssTransform, Done};
use crate::classify::classify;
use crate::engine::Engine;
use crate::errors::TransformError;
use crate::model::{Contents, FileRecord};

pub const DEFAULT_CONCURRENCY: usize = 1;

pub struct TransformStream {
    output: mpsc::Receiver<Completion>,
    driver: JoinHandle<usize>,
}

impl TransformStream {
    pub fn spawn<E>(transform: CssTransform<E>, mut input: mpsc::Receiver<FileRecord>, concurrency: usize) -> Self
        where E: Engine + 'static,
              E::Plugin: Clone + 'static
    {
        let concurrency = concurrency.max(1);
        let (tx, output) = mpsc::channel(concurrency * 2);
        let permits = Arc::new(Semaphore::new(concurrency));

        let driver = tokio::spawn(async move {
            let mut pumped = 0usize;
            while let Some(file) = input.recv().await {
                let Ok(permit) = Arc::clone(&permits).acquire_owned().await else {
                    break;
                };
                pumped += 1;
                debug!("stream:item #{pumped} file={}", file.path().display());
                let transform = transform.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    let placeholder = FileRecord::new(file.base(), file.path(), Contents::Null);
                    let (done, rx) = Done::channel();
                    let worker = tokio::spawn(async move { transform.transform(file, done).await });
                    let joined = worker.await;
                    let completion = match rx.await {
                        Ok(completion) => completion,
                        Err(_) => {
                            let reason = match joined {
                                Err(err) => err.to_string(),
                                Ok(()) => "completion was never signalled".to_string(),
                            };
                            error!("stream:item aborted file={} reason={reason}", placeholder.path().display());
                            Err(classify(TransformError::Aborted(reason), &placeholder))
                        }
                    };
                    let _ = tx.send(completion).await;
                    drop(permit);
                });
            }
            info!("stream:input closed after {pumped} item(s)");
            pumped
        });

        Self { output, driver }
    }

    /// Alimenta el stream con una lista fija de registros.
    pub fn from_records<E>(transform: CssTransform<E>, records: Vec<FileRecord>, concurrency: usize) -> Self
        where E: Engine + 'static,
              E::Plugin: Clone + 'static
    {
        let (tx, rx) = mpsc::channel(records.len().max(1));
        tokio::spawn(async move {
            for record in records {
                if tx.send(record).await.is_err() {
                    break;
                }
            }
        });
        Self::spawn(transform, rx, concurrency)
    }

    pub async fn next(&mut self) -> Option<Completion> {
        self.output.recv().await
    }

    /// Espera a que se vacíe el stream y devuelve todas las finalizaciones.
    pub async fn collect(mut self) -> Vec<Completion> {
        let mut out = Vec::new();
        while let Some(completion) = self.output.recv().await {
            out.push(completion);
        }
        if let Err(err) = self.driver.await {
            error!("stream:driver failed: {err}");
        }
        out
    }
}
