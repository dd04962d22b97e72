//! Output device thread.
//!
//! The cpal stream is built and owned by a dedicated thread because streams
//! are not `Send` on every platform. The thread renders through the shared
//! mixer and stays alive until it is told to shut down.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SampleFormat, SizedSample, Stream, StreamConfig};
use crossbeam_channel::{bounded, unbounded, Sender};

use super::mixer::Mixer;
use crate::AudioError;

pub(crate) enum DeviceMsg {
    Resume,
    Shutdown,
}

/// Keeps the device thread alive; dropping it closes the stream.
pub(crate) struct OutputStream {
    control: Sender<DeviceMsg>,
    thread: Option<JoinHandle<()>>,
    pub sample_rate: u32,
}

impl OutputStream {
    pub fn resume(&self) {
        let _ = self.control.send(DeviceMsg::Resume);
    }
}

impl Drop for OutputStream {
    fn drop(&mut self) {
        let _ = self.control.send(DeviceMsg::Shutdown);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

/// Open the default output device and start rendering from `mixer`.
pub(crate) fn open_default_output(
    mixer: Arc<Mutex<Mixer>>,
    clock: Arc<AtomicU64>,
) -> Result<OutputStream, AudioError> {
    let (control_tx, control_rx) = unbounded::<DeviceMsg>();
    let (ready_tx, ready_rx) = bounded::<Result<u32, AudioError>>(1);

    let thread = std::thread::Builder::new()
        .name("strumkit::output".to_owned())
        .spawn(move || {
            let (stream, sample_rate) = match build_stream(mixer, clock) {
                Ok(pair) => pair,
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };
            if let Err(e) = stream.play() {
                let _ = ready_tx.send(Err(AudioError::Play(e.to_string())));
                return;
            }
            let _ = ready_tx.send(Ok(sample_rate));

            while let Ok(msg) = control_rx.recv() {
                match msg {
                    DeviceMsg::Resume => {
                        if let Err(e) = stream.play() {
                            log::error!(target: "audio", "failed to resume output: {}", e);
                        }
                    }
                    DeviceMsg::Shutdown => break,
                }
            }
            log::debug!(target: "audio", "output thread exiting");
        })
        .map_err(AudioError::Thread)?;

    let sample_rate = ready_rx
        .recv()
        .map_err(|_| AudioError::Stream("output thread exited before start".to_string()))??;

    Ok(OutputStream {
        control: control_tx,
        thread: Some(thread),
        sample_rate,
    })
}

fn build_stream(
    mixer: Arc<Mutex<Mixer>>,
    clock: Arc<AtomicU64>,
) -> Result<(Stream, u32), AudioError> {
    let host = cpal::default_host();
    let device = host.default_output_device().ok_or(AudioError::NoDevice)?;
    let supported = device
        .default_output_config()
        .map_err(|e| AudioError::Stream(format!("failed to get output config: {}", e)))?;

    let sample_format = supported.sample_format();
    let config: StreamConfig = supported.into();
    let sample_rate = config.sample_rate.0;

    if let Ok(name) = device.name() {
        log::info!(
            target: "audio",
            "output device {} ({} Hz, {} ch, {:?})",
            name,
            sample_rate,
            config.channels,
            sample_format
        );
    }

    if let Ok(mut m) = mixer.lock() {
        m.set_sample_rate(sample_rate);
    }

    let stream = match sample_format {
        SampleFormat::F32 => build_typed::<f32>(&device, &config, mixer, clock)?,
        SampleFormat::I16 => build_typed::<i16>(&device, &config, mixer, clock)?,
        SampleFormat::U16 => build_typed::<u16>(&device, &config, mixer, clock)?,
        other => return Err(AudioError::UnsupportedFormat(format!("{:?}", other))),
    };
    Ok((stream, sample_rate))
}

fn build_typed<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    mixer: Arc<Mutex<Mixer>>,
    clock: Arc<AtomicU64>,
) -> Result<Stream, AudioError>
where
    T: SizedSample + FromSample<f32>,
{
    let channels = config.channels as usize;
    let mut scratch: Vec<f32> = Vec::new();

    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                scratch.resize(data.len(), 0.0);
                match mixer.lock() {
                    Ok(mut m) => {
                        m.render(&mut scratch, channels);
                        clock.store(m.frames(), Ordering::Release);
                    }
                    Err(_) => scratch.fill(0.0),
                }
                for (out, value) in data.iter_mut().zip(&scratch) {
                    *out = T::from_sample(*value);
                }
            },
            |err| {
                log::error!(target: "audio", "output stream error: {}", err);
            },
            None,
        )
        .map_err(|e| AudioError::Stream(format!("failed to build output stream: {}", e)))
}
