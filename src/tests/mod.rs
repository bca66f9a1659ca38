mod props;
mod support;
