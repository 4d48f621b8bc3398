//! BlueZ D-Bus radio backend.
//!
//! This backend uses the `bluer` crate to communicate with the BlueZ daemon
//! via D-Bus. It requires the `bluetoothd` daemon to be running.

use super::{Radio, ScanError};
use crate::advertisement::RawAdvertisement;
use bluer::{Adapter, AdapterEvent, Address, DiscoveryFilter, DiscoveryTransport, Session};
use futures::StreamExt;
use std::future::Future;
use std::pin::Pin;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

impl From<bluer::Error> for ScanError {
    fn from(err: bluer::Error) -> Self {
        ScanError::Bluetooth(err.to_string())
    }
}

/// Radio backed by the default BlueZ adapter.
///
/// Each `start` opens a fresh discovery session owned by a spawned task;
/// `stop` aborts the task, which drops the session and ends discovery, so
/// start/stop pairs can repeat for the lifetime of the process without
/// leaking sessions.
pub struct BluerRadio {
    // Session must outlive the adapter's D-Bus connection
    _session: Session,
    adapter: Adapter,
    session_task: Option<JoinHandle<()>>,
}

impl BluerRadio {
    /// Connect to the BlueZ daemon and power on the default adapter.
    pub async fn new() -> Result<Self, ScanError> {
        let session = Session::new().await?;
        let adapter = session.default_adapter().await?;
        adapter.set_powered(true).await?;

        Ok(Self {
            _session: session,
            adapter,
            session_task: None,
        })
    }
}

impl Radio for BluerRadio {
    fn start(
        &mut self,
        events: mpsc::Sender<RawAdvertisement>,
    ) -> Pin<Box<dyn Future<Output = Result<(), ScanError>> + Send + '_>> {
        Box::pin(async move {
            // LE only; duplicate advertisements carry no new data for us
            let filter = DiscoveryFilter {
                transport: DiscoveryTransport::Le,
                duplicate_data: false,
                ..Default::default()
            };
            if let Err(e) = self.adapter.set_discovery_filter(filter).await {
                log::warn!("failed to set discovery filter: {e}");
            }

            let mut discovery = self.adapter.discover_devices().await?;
            let adapter = self.adapter.clone();

            self.session_task = Some(tokio::spawn(async move {
                while let Some(event) = discovery.next().await {
                    if let AdapterEvent::DeviceAdded(address) = event
                        && let Err(e) = forward_device(&adapter, address, &events).await
                    {
                        log::debug!("failed to read advertisement from {address}: {e}");
                    }
                }
            }));

            Ok(())
        })
    }

    fn stop(&mut self) -> Pin<Box<dyn Future<Output = Result<(), ScanError>> + Send + '_>> {
        Box::pin(async move {
            if let Some(task) = self.session_task.take() {
                // dropping the discovery stream inside the task ends the
                // BlueZ discovery session
                task.abort();
                let _ = task.await;
            }
            Ok(())
        })
    }
}

/// Read a discovered device's properties and forward them as one
/// advertisement. Devices without manufacturer data are skipped.
async fn forward_device(
    adapter: &Adapter,
    address: Address,
    events: &mpsc::Sender<RawAdvertisement>,
) -> Result<(), ScanError> {
    let device = adapter.device(address)?;

    let Some(manufacturer_data) = device.manufacturer_data().await? else {
        return Ok(());
    };
    let name = device.name().await?;

    let _ = events
        .send(RawAdvertisement {
            mac: address.into(),
            name,
            manufacturer_data,
        })
        .await;

    Ok(())
}
