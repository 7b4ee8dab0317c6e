//! The `post_install` block written into the Podfile.
//!
//! The block keeps Flutter's per-target build settings, strips
//! `-GCC_WARN_INHIBIT_ALL_WARNINGS` from the BoringSSL-GRPC source build
//! phase (clang rejects it), and pins every pod to iOS 12.0.

/// Deployment target forced onto every pod target.
pub const DEPLOYMENT_TARGET: &str = "12.0";

/// Pod target whose compiler flags get cleaned up.
pub const BORINGSSL_TARGET: &str = "BoringSSL-GRPC";

/// Compiler flag removed from the BoringSSL-GRPC build phase files.
pub const STRIPPED_COMPILER_FLAG: &str = "-GCC_WARN_INHIBIT_ALL_WARNINGS";

// `    \n` lines are blank lines holding four spaces.
const POST_INSTALL_BLOCK: &str = "
post_install do |installer|
  installer.pods_project.targets.each do |target|
    flutter_additional_ios_build_settings(target)
    \n    # Fix for BoringSSL-GRPC compilation error
    if target.name == 'BoringSSL-GRPC'
      target.source_build_phase.files.each do |file|
        if file.settings && file.settings['COMPILER_FLAGS']
          flags = file.settings['COMPILER_FLAGS'].split
          flags.reject! { |flag| flag == '-GCC_WARN_INHIBIT_ALL_WARNINGS' }
          file.settings['COMPILER_FLAGS'] = flags.join(' ')
        end
      end
    end
    \n    # Ensure iOS 12.0 deployment target
    target.build_configurations.each do |config|
      config.build_settings['IPHONEOS_DEPLOYMENT_TARGET'] = '12.0'
    end
  end
end
";

/// The replacement block, trimmed of surrounding whitespace.
///
/// Starts with the `post_install do |installer|` marker and ends with a bare
/// `end` line, so the section locator finds it again on the next run.
pub fn replacement_block() -> &'static str {
    POST_INSTALL_BLOCK.trim()
}
