use crate::error::Result;
use crate::fmt::rupees_rounded;
use crate::settings::{load_settings, save_settings, settings_path, validate_salary};

pub fn show() -> Result<()> {
    let settings = load_settings();
    println!("Settings:    {}", settings_path().display());
    println!("Salary:      {}", rupees_rounded(settings.salary));
    println!("Months:      {}", settings.months);
    println!("Export dir:  {}", settings.export_dir);
    Ok(())
}

pub fn set(salary: Option<f64>, months: Option<u32>, export_dir: Option<String>) -> Result<()> {
    let mut settings = load_settings();
    if let Some(salary) = salary {
        settings.salary = validate_salary(salary)?;
    }
    if let Some(months) = months {
        settings.months = months;
    }
    if let Some(dir) = export_dir {
        settings.export_dir = dir;
    }
    save_settings(&settings)?;
    println!("Saved {}", settings_path().display());
    Ok(())
}
