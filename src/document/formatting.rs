use std::{fmt::Display, fs::File, path::Path};

use log::{debug, info};
use tempfile::TempPath;

use crate::{
    document::{OutputDocument, CEP, LAT, LATITUDE, LON, LONGITUDE, TIME},
    errors::Error,
    metadata::{AttributeValue, Attributes},
};

fn nc_value(value: &AttributeValue) -> netcdf::AttributeValue {
    match value {
        AttributeValue::Text(s) => netcdf::AttributeValue::Str(s.clone()),
        AttributeValue::Double(v) => netcdf::AttributeValue::Double(*v),
        AttributeValue::Int(v) => netcdf::AttributeValue::Int(*v),
    }
}

fn write_error(path: &Path, e: impl Display) -> Error {
    Error::Write(format!("{}: {}", path.display(), e))
}

/// Reserves a uniquely named staging file `.<name>.XXXXXX.tmp` in `parent`.
/// The file is deleted when dropped, unless persisted.
fn staging_file(path: &Path, parent: &Path) -> Result<TempPath, Error> {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    tempfile::Builder::new()
        .prefix(&format!(".{}.", name))
        .suffix(".tmp")
        .tempfile_in(parent)
        .map(|file| file.into_temp_path())
        .map_err(|e| write_error(path, e))
}

impl OutputDocument {
    /// Writes this [OutputDocument] to `path`, replacing any existing file.
    ///
    /// The file is entirely written and synced next to its destination,
    /// then renamed onto it. On failure the destination is left untouched.
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let path = path.as_ref();

        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        if !parent.is_dir() {
            return Err(Error::Write(format!(
                "{}: directory \"{}\" does not exist",
                path.display(),
                parent.display()
            )));
        }

        if path.is_dir() {
            return Err(Error::Write(format!("{}: is a directory", path.display())));
        }

        let staging = staging_file(path, parent)?;
        debug!("staging {} in {}", path.display(), staging.display());

        self.format(&staging)?;

        File::open(&staging)
            .and_then(|fd| fd.sync_all())
            .map_err(|e| write_error(&staging, e))?;

        // a failed rename drops (and deletes) the staging file
        staging.persist(path).map_err(|e| write_error(path, e))?;

        info!(
            "{} - {} samples written",
            path.display(),
            self.sample_count()
        );

        Ok(())
    }

    /// Encodes the complete netCDF layout at `path`.
    fn format(&self, path: &Path) -> Result<(), Error> {
        let nc_err = |e: netcdf::Error| write_error(path, e);

        let mut file = netcdf::create(path).map_err(nc_err)?;

        file.add_dimension(TIME, self.samples.len())
            .map_err(nc_err)?;

        for (key, value) in self.attributes.global.iter() {
            file.add_attribute(key, nc_value(value)).map_err(nc_err)?;
        }

        let series: [(&str, Vec<f64>); 4] = [
            (
                TIME,
                self.samples
                    .iter()
                    .map(|s| s.epoch.to_unix_seconds())
                    .collect(),
            ),
            (LATITUDE, self.samples.iter().map(|s| s.latitude).collect()),
            (LONGITUDE, self.samples.iter().map(|s| s.longitude).collect()),
            (CEP, self.samples.iter().map(|s| s.cep).collect()),
        ];

        for (name, values) in series.iter() {
            let mut var = file.add_variable::<f64>(name, &[TIME]).map_err(nc_err)?;
            put_attributes(&mut var, self.attribute_list(name)?).map_err(nc_err)?;
            var.put_values(values.as_slice(), ..).map_err(nc_err)?;
        }

        for (name, value) in [(LAT, self.latitude), (LON, self.longitude)] {
            let mut var = file.add_variable::<f64>(name, &[]).map_err(nc_err)?;
            put_attributes(&mut var, self.attribute_list(name)?).map_err(nc_err)?;
            var.put_value(value, ..).map_err(nc_err)?;
        }

        // closes and flushes
        drop(file);
        Ok(())
    }

    fn attribute_list(&self, variable: &str) -> Result<&Attributes, Error> {
        self.attributes.variable(variable).ok_or_else(|| {
            Error::IncompleteMetadata(format!("variable \"{}\" is not described", variable))
        })
    }
}

fn put_attributes(
    var: &mut netcdf::VariableMut<'_>,
    attributes: &Attributes,
) -> Result<(), netcdf::Error> {
    for (key, value) in attributes.iter() {
        var.put_attribute(key, nc_value(value))?;
    }
    Ok(())
}
