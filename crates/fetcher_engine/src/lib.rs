//! Fetcher engine: archive discovery, liveness probing and the pipeline that joins them.
mod archive;
mod input;
mod persist;
mod pipeline;
mod probe;
mod sink;
mod types;
mod validate;

pub use archive::{ArchiveIndex, ArchiveSettings, CdxArchiveClient, DEFAULT_ARCHIVE_ENDPOINT};
pub use input::{load_domain_directory, load_lines, InputError};
pub use persist::{write_results, AtomicFileWriter, PersistError};
pub use pipeline::{Pipeline, PipelineConfig, ResultSet, SetupError};
pub use probe::{HeadProbe, LivenessProbe, ProbeClientError, ProbeSettings};
pub use sink::{ChannelEventSink, EventSink, NullEventSink};
pub use types::{FailureKind, FetchError};
pub use validate::{Validator, ValidatorSettings};

pub use fetcher_core::{PipelineEvent, Stage, TypeSignatures};
pub use tokio_util::sync::CancellationToken;
