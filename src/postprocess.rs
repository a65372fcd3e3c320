//! Post-processing of rendered SCIM objects.
//!
//! A [`PostProcessor`] can veto an object type, rewrite objects of a type,
//! or leave them alone. [`PostProcessorChain`] runs a sequence of them.

use std::collections::BTreeMap;

use log::debug;

use crate::error::Error;

/// How a processor wants objects of a given type handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Objects of this type must not be sent at all.
    Block,
    /// Objects of this type go through [`PostProcessor::process`].
    Process,
    /// Objects of this type are sent unchanged.
    Skip,
}

/// A named transform over serialized objects.
pub trait PostProcessor: Send {
    /// Name used in error messages and to select configuration options.
    fn name(&self) -> &str;

    /// Receive the options addressed to this processor, prefix stripped.
    fn init(&mut self, options: &BTreeMap<String, String>) -> Result<(), Error> {
        let _ = options;
        Ok(())
    }

    fn wants(&self, object_type: &str) -> Disposition;

    fn process(&self, object_type: &str, input: &str) -> Result<String, Error>;

    /// Called once when the processor is no longer needed.
    fn shutdown(&mut self) {}
}

/// Ordered sequence of processors.
#[derive(Default)]
pub struct PostProcessorChain {
    processors: Vec<Box<dyn PostProcessor>>,
}

impl PostProcessorChain {
    pub fn new(processors: Vec<Box<dyn PostProcessor>>) -> Self {
        Self { processors }
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }

    /// Initialize every processor with the options keyed `pp-<name>-<option>`.
    ///
    /// Processors see `<option>` only. A key that fits several processors,
    /// such as `pp-a-b-x` with processors `a` and `a-b`, goes to the one with
    /// the longest name.
    pub fn init(&mut self, options: &BTreeMap<String, String>) -> Result<(), Error> {
        let names: Vec<String> = self
            .processors
            .iter()
            .map(|p| p.name().to_string())
            .collect();
        for processor in &mut self.processors {
            let name = processor.name().to_string();
            let own = options_for(&name, &names, options);
            processor.init(&own).map_err(|e| {
                Error::PostProcess(format!("failed to initialize '{}': {}", name, e))
            })?;
            debug!("initialized post-processor '{}' with {} option(s)", name, own.len());
        }
        Ok(())
    }

    /// Drop every type blocked by at least one processor, keeping order.
    pub fn filter_types<S: AsRef<str>>(&self, types: &[S]) -> Vec<String> {
        types
            .iter()
            .map(|t| t.as_ref())
            .filter(|t| {
                !self
                    .processors
                    .iter()
                    .any(|p| p.wants(t) == Disposition::Block)
            })
            .map(str::to_string)
            .collect()
    }

    /// Run `input` through every processor that wants to process `object_type`.
    pub fn process(&self, object_type: &str, input: &str) -> Result<String, Error> {
        let mut next = input.to_string();
        for processor in &self.processors {
            if processor.wants(object_type) == Disposition::Process {
                next = processor.process(object_type, &next).map_err(|e| {
                    Error::PostProcess(format!(
                        "'{}' failed on object of type {}: {}",
                        processor.name(),
                        object_type,
                        e
                    ))
                })?;
            }
        }
        Ok(next)
    }
}

fn options_for(
    name: &str,
    names: &[String],
    options: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let prefix = format!("pp-{}-", name);
    let longer: Vec<String> = names
        .iter()
        .filter(|other| other.len() > name.len())
        .map(|other| format!("pp-{}-", other))
        .collect();

    options
        .iter()
        .filter(|(k, _)| !longer.iter().any(|p| k.starts_with(p.as_str())))
        .filter_map(|(k, v)| k.strip_prefix(&prefix).map(|k| (k.to_string(), v.clone())))
        .collect()
}

impl Drop for PostProcessorChain {
    fn drop(&mut self) {
        for processor in &mut self.processors {
            processor.shutdown();
        }
    }
}
